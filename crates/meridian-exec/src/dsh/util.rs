//! Date and username helpers shared by DSH bodies, loader, and workload.

/// Days per month under the non-leap calendar every DSH year uses.
const DAYS_IN_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Formats a date as `dd-mm-yyyy`.
#[must_use]
pub fn format_date(day: u32, month: u32, year: u32) -> String {
    format!("{day:02}-{month:02}-{year}")
}

/// Formats a raw username into its fixed 20-byte storage form: a 2-digit
/// length, underscore padding, and the name right-aligned at the end.
///
/// # Panics
///
/// Panics when the raw name exceeds 18 characters.
#[must_use]
pub fn format_uname(uname: &str) -> String {
    let len = uname.len();
    assert!(len <= 18, "invalid username, must be <= 18 characters: {uname}");
    format!("{len:02}{}{uname}", "_".repeat(18 - len))
}

/// Squared Euclidean distance between two coordinates.
#[inline]
#[must_use]
pub fn dist(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x1 - x2) * (x1 - x2) + (y1 - y2) * (y1 - y2)
}

fn parse_date(date: &str) -> Option<(u32, u32, u32)> {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[2] != b'-' || bytes[5] != b'-' {
        return None;
    }
    let day = date.get(0..2)?.parse().ok()?;
    let month = date.get(3..5)?.parse().ok()?;
    let year = date.get(6..10)?.parse().ok()?;
    if day == 0 || month == 0 || month > 12 {
        return None;
    }
    Some((day, month, year))
}

/// Enumerates the dates of a stay: every day in `[in_date, out_date)` in
/// order, `dd-mm-yyyy` formatted. The checkout day is not part of the
/// stay. Empty when `in_date >= out_date` or either date is malformed.
#[must_use]
pub fn date_interp(in_date: &str, out_date: &str) -> Vec<String> {
    let (Some((mut d, mut m, mut y)), Some((d2, m2, y2))) =
        (parse_date(in_date), parse_date(out_date))
    else {
        return Vec::new();
    };
    if (y, m, d) >= (y2, m2, d2) {
        return Vec::new();
    }

    let mut dates = Vec::new();
    while (d, m, y) != (d2, m2, y2) {
        dates.push(format_date(d, m, y));
        d += 1;
        if d > DAYS_IN_MONTH[(m - 1) as usize] {
            d = 1;
            m += 1;
            if m > 12 {
                m = 1;
                y += 1;
            }
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_date_pads() {
        assert_eq!(format_date(1, 6, 2020), "01-06-2020");
        assert_eq!(format_date(31, 12, 2020), "31-12-2020");
    }

    #[test]
    fn test_format_uname_layout() {
        let formatted = format_uname("37");
        assert_eq!(formatted.len(), 20);
        assert_eq!(&formatted[..2], "02");
        assert_eq!(&formatted[18..], "37");
        assert!(formatted[2..18].bytes().all(|b| b == b'_'));
    }

    #[test]
    fn test_date_interp_counts_days() {
        let range = date_interp("01-06-2020", "04-06-2020");
        assert_eq!(range, vec!["01-06-2020", "02-06-2020", "03-06-2020"]);
    }

    #[test]
    fn test_date_interp_rolls_over_month_and_year() {
        let range = date_interp("30-12-2020", "02-01-2021");
        assert_eq!(range, vec!["30-12-2020", "31-12-2020", "01-01-2021"]);
    }

    #[test]
    fn test_date_interp_ignores_leap_years() {
        let range = date_interp("28-02-2020", "01-03-2020");
        assert_eq!(range, vec!["28-02-2020"]);
    }

    #[test]
    fn test_date_interp_empty_when_not_before() {
        assert!(date_interp("04-06-2020", "04-06-2020").is_empty());
        assert!(date_interp("05-06-2020", "04-06-2020").is_empty());
        assert!(date_interp("garbage", "04-06-2020").is_empty());
    }
}
