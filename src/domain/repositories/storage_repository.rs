// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 存储错误
    #[error("Storage error: {0}")]
    Other(String),
}

/// 诊断快照存储特质
///
/// 出错时保存截图或页面HTML，返回的引用会写入运行日志和队列条目
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// 使用指定键保存数据，返回可供人工查看的引用
    async fn save(&self, key: &str, data: &[u8]) -> Result<String, StorageError>;

    /// 根据键读取数据
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// 删除指定键，键不存在时不报错
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// 检查指定键是否存在
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}
