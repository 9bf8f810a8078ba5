/// The parsed, structured form of a single log line.
///
/// Owned by the parser until absorbed by the aggregation store. Any field
/// absent in the current log format is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogItem {
    pub host: Option<String>,
    /// `YYYYMMDD`.
    pub date: Option<String>,
    /// `HH:MM:SS`.
    pub time: Option<String>,
    pub request: Option<String>,
    pub method: Option<String>,
    pub protocol: Option<String>,
    /// Three-character status code, after any `code444-as-404` folding.
    pub status: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub resp_size: u64,
    /// Time served, in microseconds.
    pub time_served_us: u64,
    pub vhost: Option<String>,
    pub remote_user: Option<String>,
    pub cache_status: Option<String>,
    /// `true` when the request's URL matched the static-file extension list.
    pub is_static: bool,
}

impl LogItem {
    /// The composite unique-visitor key: `host|YYYYMMDD|agent`.
    #[must_use]
    pub fn visitor_key(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        let date = self.date.as_deref()?;
        let agent = self.user_agent.as_deref().unwrap_or("-");
        Some(format!("{host}|{date}|{agent}"))
    }

    /// First-digit class of the status code, as the descriptive label used
    /// as the `STATUS_CODES` module key (spec §4.2 item 6).
    #[must_use]
    pub fn status_class(&self) -> Option<&'static str> {
        let status = self.status.as_deref()?;
        let first = status.as_bytes().first()?;
        Some(match first {
            b'1' => "1xx Informational",
            b'2' => "2xx Success",
            b'3' => "3xx Redirection",
            b'4' => "4xx Client Errors",
            b'5' => "5xx Server Errors",
            _ => return None,
        })
    }

    /// The hour (`"00"`-`"23"`) extracted from `time`, for `VISIT_TIMES`.
    #[must_use]
    pub fn hour(&self) -> Option<&str> {
        self.time.as_deref().and_then(|t| t.get(0..2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visitor_key_requires_host_and_date() {
        let item = LogItem {
            host: Some("127.0.0.1".to_string()),
            date: Some("20150110".to_string()),
            user_agent: Some("curl/7.0".to_string()),
            ..Default::default()
        };
        assert_eq!(item.visitor_key().unwrap(), "127.0.0.1|20150110|curl/7.0");
    }

    #[test]
    fn status_class_groups_by_first_digit() {
        let mut item = LogItem::default();
        item.status = Some("404".to_string());
        assert_eq!(item.status_class(), Some("4xx Client Errors"));
        item.status = Some("200".to_string());
        assert_eq!(item.status_class(), Some("2xx Success"));
    }

    #[test]
    fn hour_extracts_leading_two_digits() {
        let mut item = LogItem::default();
        item.time = Some("12:34:56".to_string());
        assert_eq!(item.hour(), Some("12"));
    }
}
