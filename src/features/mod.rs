/// 首字母头像：生成、存储与读取
pub mod avatar;

/// 健康检查与服务描述
pub mod health;

/// 存储统计
pub mod stats;
