pub mod assignment;
pub mod dashboard;
pub mod employee;
pub mod search;
pub mod ticket;

use std::str::FromStr;

/// Malformed input, rejected before the store is touched. Carries the name
/// of the offending field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidArgument(pub &'static str);

pub(crate) fn parse_id<T: FromStr>(
    raw: &str,
    field: &'static str,
) -> Result<T, InvalidArgument> {
    raw.parse().map_err(|_| InvalidArgument(field))
}
