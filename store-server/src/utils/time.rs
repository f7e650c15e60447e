//! 时间工具函数: 营业时区与 `HH:mm` 格式
//!
//! 店铺文档中的营业时间均以业务时区的 `HH:mm` 字符串存储，
//! 调度器以分钟粒度做精确匹配。

use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

/// 店铺时间字段的存储格式
pub const TIME_PATTERN: &str = "%H:%M";

/// UTC 时刻换算为业务时区的本地时间
pub fn business_time(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

/// 截断到分钟 (秒与纳秒清零)
pub fn truncate_to_minute<T: Timelike + Copy>(dt: T) -> T {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

/// 格式化为 `HH:mm`
pub fn format_time_of_day(dt: NaiveDateTime) -> String {
    dt.format(TIME_PATTERN).to_string()
}

/// ISO 星期 (1 = 周一 .. 7 = 周日)
pub fn iso_weekday(dt: NaiveDateTime) -> u32 {
    dt.weekday().number_from_monday()
}

/// 严格解析 `HH:mm` (必须两位小时、两位分钟)
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let bytes = value.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    NaiveTime::parse_from_str(value, TIME_PATTERN).ok()
}
