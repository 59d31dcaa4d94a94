use crate::record::DerivedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extreme {
    Min,
    Max,
}

/// The extreme value of a key and every row that attains it.
#[derive(Debug, Clone)]
pub struct Extremum<'a, K> {
    pub value: K,
    pub rows: Vec<&'a DerivedRecord>,
}

/// Finds all records whose `key` equals the minimum or maximum over `records`.
///
/// Ties are all returned, in input order. `None` means no record was given.
pub fn extremum_by<'a, K, F>(
    records: &[&'a DerivedRecord],
    extreme: Extreme,
    key: F,
) -> Option<Extremum<'a, K>>
where
    K: Ord + Copy,
    F: Fn(&DerivedRecord) -> K,
{
    let keys = records.iter().map(|r| key(*r));
    let value = match extreme {
        Extreme::Min => keys.min()?,
        Extreme::Max => keys.max()?,
    };

    let rows = records
        .iter()
        .copied()
        .filter(|r| key(*r) == value)
        .collect();

    Some(Extremum { value, rows })
}
