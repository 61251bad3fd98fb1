/// Turns an arbitrary label into a fragment that is safe to use as a single
/// segment of a dotted statsd metric path.
///
/// ASCII letters, digits, `_` and `-` are kept.  Whitespace, `/` and `.` turn
/// into `_`, so a label can never introduce additional path segments.  Every
/// other character is dropped.
///
/// # Examples
///
/// ```
/// use runstats_core::sanitize_metric_name;
///
/// assert_eq!(sanitize_metric_name("my.metric name"), "my_metric_name");
/// assert_eq!(sanitize_metric_name("my-metric@name"), "my-metricname");
/// ```
pub fn sanitize_metric_name(name: &str) -> String {
    name.chars()
        .filter_map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' => Some(c),
            '/' | '.' => Some('_'),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect()
}
