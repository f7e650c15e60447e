//! Store Model
//!
//! 店铺文档。营业状态字段由调度器和手动开关店操作维护，
//! 描述性字段 (名称、地址、图片等) 原样透传。

use serde::{Deserialize, Serialize};

/// Store entity
///
/// `id` 是记录键 (不含表名)，由查询中的 `record::id(id) AS store_id` 投影得到。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(rename = "store_id")]
    pub id: String,
    /// 是否营业中
    #[serde(default)]
    pub open_state: bool,
    /// 是否参与自动开店
    #[serde(default)]
    pub is_auto: bool,
    /// 营业时间 (HH:mm)
    pub open_time: Option<String>,
    /// 打烊时间 (HH:mm)，自动关店按此匹配
    pub close_time: Option<String>,
    /// 售卖开始 (HH:mm)，自动开店按此匹配
    pub sale_start: Option<String>,
    /// 售卖结束 (HH:mm)
    pub sale_end: Option<String>,
    /// 允许自动开店的 ISO 星期 (1 = 周一 .. 7 = 周日)
    #[serde(default)]
    pub open_day_of_week: Vec<u32>,

    // ===== 描述性字段 =====
    pub store_name: Option<String>,
    pub address: Option<String>,
    pub store_image: Option<String>,
    pub store_description: Option<String>,
    pub store_number: Option<String>,
    pub store_map_url: Option<String>,
    pub origin_info: Option<String>,
    pub additional_comment: Option<String>,
}

/// Provisioning payload (record key is passed separately)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewStore {
    pub open_state: bool,
    pub is_auto: bool,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub sale_start: Option<String>,
    pub sale_end: Option<String>,
    pub open_day_of_week: Vec<u32>,
    pub store_name: Option<String>,
    pub address: Option<String>,
    pub store_image: Option<String>,
    pub store_description: Option<String>,
    pub store_number: Option<String>,
    pub store_map_url: Option<String>,
    pub origin_info: Option<String>,
    pub additional_comment: Option<String>,
}

/// Full-set configuration update
///
/// Every field is written, absent optional values clear the stored field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfigUpdate {
    pub address: Option<String>,
    pub store_name: Option<String>,
    pub store_number: Option<String>,
    pub open_time: String,
    pub close_time: String,
    pub sale_start: String,
    pub sale_end: String,
    pub additional_comment: Option<String>,
}
