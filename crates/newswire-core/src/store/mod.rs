mod article_repo;
mod category_repo;
mod database;

pub use article_repo::{ArticleFilter, ArticleRepository, UpsertOutcome};
pub use category_repo::CategoryRepository;
pub use database::Database;
