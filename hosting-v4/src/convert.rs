//! Identifier conversions between domain strings and v4 integers.

use hosting::{HostingError, Result};

/// Megabytes per gigabyte; v4 expresses disk sizes in MB.
pub const MB_PER_GB: i64 = 1024;

/// Parse a required identifier: empty is `NotProvided`, garbage is `Parse`.
pub fn required_id(entity: &'static str, field: &'static str, value: &str) -> Result<i64> {
    if value.is_empty() {
        return Err(HostingError::not_provided(entity, field));
    }
    parse_id(entity, field, value)
}

/// Parse an identifier that must be numeric, empty included.
pub fn parse_id(entity: &'static str, field: &'static str, value: &str) -> Result<i64> {
    value
        .parse()
        .map_err(|_| HostingError::parse(entity, field, value))
}

/// Parse a filter identifier: empty is skipped, garbage is `Parse`.
pub fn optional_id(entity: &'static str, field: &'static str, value: &str) -> Result<Option<i64>> {
    if value.is_empty() {
        Ok(None)
    } else {
        parse_id(entity, field, value).map(Some)
    }
}

/// Wire size of `gb`; sizes beyond the wire range are a `Parse` error on
/// `entity.Size`.
pub fn gb_to_mb(entity: &'static str, gb: u64) -> Result<i64> {
    i64::try_from(gb)
        .ok()
        .and_then(|gb| gb.checked_mul(MB_PER_GB))
        .ok_or_else(|| HostingError::parse(entity, "Size", gb.to_string()))
}

/// Integer division: fractions of a GB are dropped.
pub fn mb_to_gb(mb: i64) -> u64 {
    u64::try_from(mb / MB_PER_GB).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_distinguishes_missing_from_bad() {
        assert!(matches!(
            required_id("Disk", "ID", ""),
            Err(HostingError::NotProvided { field: "ID", .. })
        ));
        assert!(matches!(
            required_id("Disk", "ID", "badid"),
            Err(HostingError::Parse { field: "ID", .. })
        ));
        assert_eq!(required_id("Disk", "ID", "42").unwrap(), 42);
    }

    #[test]
    fn optional_skips_only_empty() {
        assert_eq!(optional_id("DiskFilter", "ID", "").unwrap(), None);
        assert_eq!(optional_id("DiskFilter", "ID", "0").unwrap(), Some(0));
        assert!(optional_id("DiskFilter", "ID", " 1").is_err());
    }

    #[test]
    fn sizes_convert_with_integer_division() {
        assert_eq!(gb_to_mb("Disk", 15).unwrap(), 15360);
        assert_eq!(mb_to_gb(15360), 15);
        assert_eq!(mb_to_gb(3071), 2);
        assert_eq!(mb_to_gb(-1024), 0);
    }

    #[test]
    fn oversized_gb_is_a_parse_error() {
        assert_eq!(
            gb_to_mb("DiskSpec", (i64::MAX / MB_PER_GB) as u64).unwrap(),
            (i64::MAX / MB_PER_GB) * MB_PER_GB
        );
        for gb in [(i64::MAX / MB_PER_GB) as u64 + 1, 1 << 62, u64::MAX] {
            assert!(matches!(
                gb_to_mb("DiskSpec", gb),
                Err(HostingError::Parse { entity: "DiskSpec", field: "Size", .. })
            ));
        }
    }
}
