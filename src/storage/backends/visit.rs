use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::*;

use crate::errors::AppError;
use crate::models::VisitStatus;
use crate::storage::entities::{prelude::*, *};
use crate::storage::repository::VisitRepository;

use super::super::backend::SeaOrmBackend;

#[async_trait]
impl VisitRepository for SeaOrmBackend {
    async fn create_visit(
        &self,
        user_id: i32,
        visit_date: DateTime<Utc>,
    ) -> Result<visits::Model, AppError> {
        let visit = visits::ActiveModel {
            user_id: Set(user_id),
            visit_date: Set(visit_date.into()),
            status: Set(VisitStatus::Scheduled.as_str().to_string()),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let result = visit.insert(self.db.as_ref()).await?;
        Ok(result)
    }

    async fn list_upcoming_visits(
        &self,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> Result<Vec<visits::Model>, AppError> {
        let now: DateTimeWithTimeZone = now.into();
        let visits = Visits::find()
            .filter(visits::Column::UserId.eq(user_id))
            .filter(visits::Column::VisitDate.gt(now))
            .filter(visits::Column::Status.eq(VisitStatus::Scheduled.as_str()))
            .order_by_asc(visits::Column::VisitDate)
            .all(self.db.as_ref())
            .await?;
        Ok(visits)
    }

    async fn latest_scheduled_visit(
        &self,
        user_id: i32,
    ) -> Result<Option<visits::Model>, AppError> {
        let visit = Visits::find()
            .filter(visits::Column::UserId.eq(user_id))
            .filter(visits::Column::Status.eq(VisitStatus::Scheduled.as_str()))
            .order_by_desc(visits::Column::VisitDate)
            .one(self.db.as_ref())
            .await?;
        Ok(visit)
    }
}
