use crate::models::{MismatchEntry, RawMismatch, ZeroOverpayPolicy};

/// 分类后每个原始位置落入的分区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Inconsistency,
    Overcharge,
}

/// 比对项分区: 不一致项与超收项, 各自保持原始相对顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    pub inconsistencies: Vec<MismatchEntry>,
    pub overcharges: Vec<MismatchEntry>,
    order: Vec<Partition>,
}

impl Classified {
    /// 按原始顺序重新交错两个分区
    pub fn into_entries(self) -> Vec<MismatchEntry> {
        let mut inconsistencies = self.inconsistencies.into_iter();
        let mut overcharges = self.overcharges.into_iter();
        self.order
            .iter()
            .filter_map(|p| match p {
                Partition::Inconsistency => inconsistencies.next(),
                Partition::Overcharge => overcharges.next(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// 拆分比对结果; null 元素被过滤, 不会报错
pub fn classify<'a, I>(entries: I, policy: ZeroOverpayPolicy) -> Classified
where
    I: IntoIterator<Item = &'a Option<RawMismatch>>,
{
    let mut classified = Classified::default();
    for raw in entries.into_iter().flatten() {
        let entry = MismatchEntry::from_raw(raw.clone(), policy);
        if entry.is_overcharge() {
            classified.order.push(Partition::Overcharge);
            classified.overcharges.push(entry);
        } else {
            classified.order.push(Partition::Inconsistency);
            classified.inconsistencies.push(entry);
        }
    }
    classified
}
