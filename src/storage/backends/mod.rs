// 按实体拆分的仓储实现
mod user;
mod visit;
