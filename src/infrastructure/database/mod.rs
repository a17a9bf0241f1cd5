//! Database backends

mod mysql;

pub use mysql::{MysqlCredentials, RemoteMysql};
