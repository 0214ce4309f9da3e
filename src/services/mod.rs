pub mod posts;

use diesel_async::pooled_connection::deadpool;
use diesel_async::AsyncMysqlConnection;

pub type Pool = deadpool::Pool<AsyncMysqlConnection>;
