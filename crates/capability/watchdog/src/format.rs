//! 时长格式化：毫秒 -> 人类可读文本。

/// 将非负毫秒数格式化为 `"2d 3h"` 风格的文本。
///
/// 按 天/时/分/秒 分解，只输出非零分量；不足一秒且无更大分量时
/// 输出 `"0s"` 而不是空串。对所有输入确定且有定义。
pub fn format_duration(ms: u64) -> String {
    let total_secs = ms / 1_000;
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if minutes > 0 {
        parts.push(format!("{minutes}m"));
    }
    if seconds > 0 {
        parts.push(format!("{seconds}s"));
    }

    if parts.is_empty() {
        return "0s".to_string();
    }
    parts.join(" ")
}
