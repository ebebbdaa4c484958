use chrono::{NaiveDateTime, Utc};

/// Current wall clock as the naive UTC value stored in timestamp columns.
pub fn now_utc() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Round for display; stored aggregates keep full precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `ceil(total / page_size)`, with zero pages for an empty set or a zero page size.
pub fn total_pages(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 0;
    }
    (total + page_size - 1) / page_size
}

/// Row offset for a zero-based page, saturating instead of overflowing.
pub fn page_offset(page_index: i64, page_size: i64) -> i64 {
    page_index.max(0).saturating_mul(page_size.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(15, 10), 2);
        assert_eq!(total_pages(20, 10), 2);
        assert_eq!(total_pages(21, 10), 3);
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn round2_keeps_two_decimals() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.0 / 3.0), 0.67);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn page_offset_saturates() {
        assert_eq!(page_offset(1, 10), 10);
        assert_eq!(page_offset(-3, 10), 0);
        assert_eq!(page_offset(i64::MAX, 10), i64::MAX);
    }
}
