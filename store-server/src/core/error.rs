use thiserror::Error;

/// 启动/运行期的服务器错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("数据库初始化失败: {0}")]
    Database(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
