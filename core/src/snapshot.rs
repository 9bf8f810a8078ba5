use std::cmp::Ordering;

use vantage_store::Store;
use vantage_types::{HolderItem, HolderSnapshot, MetricsRecord, Module, Sort, SortField, SortOrder, SubItem};

/// Default truncation applied to every snapshot unless the caller overrides
/// it (spec §4.4, "`MAX_CHOICES` default 366, configurable").
pub const DEFAULT_MAX_CHOICES: usize = 366;

/// Build a sorted, top-N snapshot of one module (spec §4.4, steps 1-5).
///
/// `sort` is silently coerced to `SortField::Hits` when it isn't legal for
/// `module` (the caller is expected to have validated the sort against
/// [`crate::is_legal_sort`] before reaching here; this is the builder's own
/// defense against a stale or hand-constructed `Sort`).
#[must_use]
pub fn build_snapshot(store: &Store, module: Module, sort: Sort, max_choices: usize) -> HolderSnapshot {
    let sort = if crate::is_legal_sort(module, sort.field) {
        sort
    } else {
        Sort::hits_desc()
    };

    let Some(map) = store.module(module) else {
        return HolderSnapshot::default();
    };

    let process_total_hits: u64 = map.values().map(|r| r.hits).sum();
    let max_hits = map.values().map(|r| r.hits).max().unwrap_or(0);
    let max_visitors = map.values().map(|r| r.visitors).max().unwrap_or(0);

    let mut entries: Vec<(&String, &MetricsRecord)> = map.iter().collect();
    entries.sort_by(|(a_key, a_rec), (b_key, b_rec)| compare_records(a_key, a_rec, b_key, b_rec, sort));
    entries.truncate(max_choices);

    let items = entries
        .into_iter()
        .map(|(key, record)| {
            let mut sub_list = record.sub_items.clone();
            if module.has_sub_items() {
                sort_sub_items(&mut sub_list, sort);
            }
            HolderItem {
                data: key.clone(),
                metrics: record.clone(),
                method: record.method.clone(),
                protocol: record.protocol.clone(),
                sub_list,
                percentage: record.percentage(process_total_hits),
            }
        })
        .collect();

    HolderSnapshot {
        items,
        process_total_hits,
        max_hits,
        max_visitors,
    }
}

fn compare_records(
    a_key: &str,
    a: &MetricsRecord,
    b_key: &str,
    b: &MetricsRecord,
    sort: Sort,
) -> Ordering {
    let ordering = match sort.field {
        SortField::Hits => a.hits.cmp(&b.hits),
        SortField::Visitors => a.visitors.cmp(&b.visitors),
        SortField::Data => a_key.cmp(b_key),
        SortField::Bw => a.bandwidth.cmp(&b.bandwidth),
        SortField::Usec => a.avg_ts_us.cmp(&b.avg_ts_us),
        SortField::Prot => a.protocol.as_deref().cmp(&b.protocol.as_deref()),
        SortField::Mthd => a.method.as_deref().cmp(&b.method.as_deref()),
    };
    apply_order(ordering, sort.order)
}

/// Sub-items only ever carry `data`/`hits`/`visitors`/`bw` (spec §3); a sort
/// field with no sub-item counterpart (`USEC`/`PROT`/`MTHD`) falls back to
/// `HITS`, since those only apply to the parent record.
fn sort_sub_items(items: &mut [SubItem], sort: Sort) {
    items.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Hits | SortField::Usec | SortField::Prot | SortField::Mthd => a.hits.cmp(&b.hits),
            SortField::Visitors => a.visitors.cmp(&b.visitors),
            SortField::Data => a.data.cmp(&b.data),
            SortField::Bw => a.bw.cmp(&b.bw),
        };
        apply_order(ordering, sort.order)
    });
}

fn apply_order(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_classify::ClassifierTables;
    use vantage_types::{GeoRecord, LogItem};

    struct UnknownGeo;
    impl vantage_classify::GeoLookup for UnknownGeo {
        fn lookup(&self, _host: &str) -> GeoRecord {
            GeoRecord::unknown()
        }
    }

    fn item(host: &str, bytes: u64) -> LogItem {
        LogItem {
            host: Some(host.to_string()),
            date: Some("20150110".to_string()),
            time: Some("10:00:00".to_string()),
            request: Some(format!("/{host}")),
            status: Some("200".to_string()),
            user_agent: Some("curl/7.0".to_string()),
            resp_size: bytes,
            ..Default::default()
        }
    }

    #[test]
    fn snapshot_sorted_descending_by_hits_default() {
        let mut store = Store::new();
        let classifiers = ClassifierTables::default();
        let geo = UnknownGeo;

        store.ingest(&item("10.0.0.1", 10), &classifiers, &geo);
        store.ingest(&item("10.0.0.1", 10), &classifiers, &geo);
        store.ingest(&item("10.0.0.2", 10), &classifiers, &geo);

        let snap = build_snapshot(&store, Module::Hosts, Sort::hits_desc(), DEFAULT_MAX_CHOICES);
        assert_eq!(snap.items[0].data, "10.0.0.1");
        assert_eq!(snap.items[0].metrics.hits, 2);
        assert_eq!(snap.process_total_hits, 3);
        assert_eq!(snap.max_hits, 2);
    }

    #[test]
    fn percentage_is_clamped_and_zero_when_empty() {
        let store = Store::new();
        let snap = build_snapshot(&store, Module::Hosts, Sort::hits_desc(), DEFAULT_MAX_CHOICES);
        assert!(snap.items.is_empty());
        assert_eq!(snap.process_total_hits, 0);
    }

    #[test]
    fn truncates_to_max_choices() {
        let mut store = Store::new();
        let classifiers = ClassifierTables::default();
        let geo = UnknownGeo;
        for i in 0..5u64 {
            store.ingest(&item(&format!("10.0.0.{i}"), 1), &classifiers, &geo);
        }

        let snap = build_snapshot(&store, Module::Hosts, Sort::hits_desc(), 2);
        assert_eq!(snap.items.len(), 2);
    }

    #[test]
    fn illegal_sort_field_falls_back_to_hits() {
        let mut store = Store::new();
        let classifiers = ClassifierTables::default();
        let geo = UnknownGeo;
        store.ingest(&item("10.0.0.1", 10), &classifiers, &geo);

        let bogus = Sort::new(SortField::Mthd, SortOrder::Desc);
        let snap = build_snapshot(&store, Module::Hosts, bogus, DEFAULT_MAX_CHOICES);
        assert_eq!(snap.items.len(), 1);
    }
}
