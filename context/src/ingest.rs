use vantage_classify::{ClassifierTables, GeoLookup};
use vantage_types::{LogItem, Module, SubItem};

use crate::referrer::{parse_keyphrase, referring_site};
use crate::store::Store;

/// What a single [`Store::ingest`] call produced, besides the counter
/// mutations applied in place.
///
/// `new_hosts` is the list this call wants enqueued to the DNS resolver
/// (spec §4.2 item 3); `Store` doesn't own the resolver queue itself, so the
/// caller (the parser/aggregator task, spec §5) is responsible for actually
/// submitting them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestOutcome {
    pub new_hosts: Vec<String>,
    pub is_crawler: bool,
}

impl Store {
    /// Apply every per-module upsert for one parsed log line (spec §4.2,
    /// items 1-8). Best-effort: an individual classification failure
    /// (unparseable OS/browser token, no geo match) degrades to "Unknown"
    /// rather than rejecting the line; only a parse failure upstream of this
    /// call counts as invalid.
    pub fn ingest(
        &mut self,
        item: &LogItem,
        classifiers: &ClassifierTables,
        geo: &dyn GeoLookup,
    ) -> IngestOutcome {
        let mut outcome = IngestOutcome::default();

        let visitor_key = item.visitor_key();
        let is_new_visitor = visitor_key
            .as_deref()
            .is_some_and(|k| self.is_new_visitor(k));
        if let Some(key) = &visitor_key {
            if is_new_visitor {
                self.visitor_keys.insert(key.clone());
            }
        }

        let bytes = item.resp_size;
        let ts_us = if item.time_served_us > 0 {
            Some(item.time_served_us)
        } else {
            None
        };

        // 1. VISITORS[date]
        if let Some(date) = &item.date {
            self.module_mut(Module::Visitors)
                .entry(date.clone())
                .or_default()
                .record_hit(bytes, is_new_visitor, None);
            *self.date_bw.entry(date.clone()).or_default() += bytes;
        }

        // 2. REQUESTS / REQUESTS_STATIC / NOT_FOUND
        if let Some(url) = &item.request {
            let module = if item.status.as_deref() == Some("404") {
                Module::NotFound
            } else if item.is_static {
                Module::RequestsStatic
            } else {
                Module::Requests
            };
            let entry = self.module_mut(module).entry(url.clone()).or_default();
            entry.record_hit(bytes, is_new_visitor, ts_us);
            if entry.method.is_none() {
                entry.method = item.method.clone();
            }
            if entry.protocol.is_none() {
                entry.protocol = item.protocol.clone();
            }
            *self.file_bw.entry(url.clone()).or_default() += bytes;
            if let Some(ts) = ts_us {
                *self.file_usecs.entry(url.clone()).or_default() += ts;
            }
        }

        // 3. HOSTS[host]
        if let Some(host) = &item.host {
            self.module_mut(Module::Hosts)
                .entry(host.clone())
                .or_default()
                .record_hit(bytes, is_new_visitor, ts_us);
            *self.host_bw.entry(host.clone()).or_default() += bytes;
            if let Some(ts) = ts_us {
                *self.host_usecs.entry(host.clone()).or_default() += ts;
            }
            if let Some(agent) = &item.user_agent {
                self.host_agents
                    .entry(host.clone())
                    .or_default()
                    .insert(agent.clone());
            }
            if self.resolved_hosts.insert(host.clone()) {
                outcome.new_hosts.push(host.clone());
            }

            let record = geo.lookup(host);
            let continent_key = record.continent_key();
            let country = record.country_name.clone();
            self.geo.insert(host.clone(), record);

            // 7. GEO_LOCATION[continent] with sub-item country
            let geo_entry = self
                .module_mut(Module::GeoLocation)
                .entry(continent_key)
                .or_default();
            geo_entry.record_hit(bytes, is_new_visitor, None);
            merge_sub_item(&mut geo_entry.sub_items, &country, bytes, is_new_visitor);
        }

        // 4. OS / BROWSERS via the classifier
        if let Some(agent) = &item.user_agent {
            outcome.is_crawler = classifiers.is_crawler(agent);

            let os = classifiers.classify_os(agent);
            let os_entry = self
                .module_mut(Module::Os)
                .entry(os.family.clone())
                .or_default();
            os_entry.record_hit(bytes, is_new_visitor, None);
            merge_sub_item(&mut os_entry.sub_items, &os.token, bytes, is_new_visitor);

            let browser = classifiers.classify_browser(agent);
            let browser_entry = self
                .module_mut(Module::Browsers)
                .entry(browser.family.clone())
                .or_default();
            browser_entry.record_hit(bytes, is_new_visitor, None);
            merge_sub_item(
                &mut browser_entry.sub_items,
                &browser.token,
                bytes,
                is_new_visitor,
            );
        }

        // 5. REFERRERS / REFERRING_SITES / KEYPHRASES
        if let Some(referrer) = &item.referrer {
            if !referrer.is_empty() && referrer != "-" {
                self.module_mut(Module::Referrers)
                    .entry(referrer.clone())
                    .or_default()
                    .record_hit(bytes, is_new_visitor, None);

                if let Some(site) = referring_site(referrer) {
                    self.module_mut(Module::ReferringSites)
                        .entry(site)
                        .or_default()
                        .record_hit(bytes, is_new_visitor, None);
                }

                if let Some(phrase) = parse_keyphrase(referrer) {
                    self.module_mut(Module::Keyphrases)
                        .entry(phrase)
                        .or_default()
                        .record_hit(bytes, is_new_visitor, None);
                }
            }
        }

        // 6. STATUS_CODES[class] with sub-item code
        if let Some(status) = &item.status {
            if let Some(class) = item.status_class() {
                let entry = self
                    .module_mut(Module::StatusCodes)
                    .entry(class.to_string())
                    .or_default();
                entry.record_hit(bytes, is_new_visitor, None);
                merge_sub_item(&mut entry.sub_items, status, bytes, is_new_visitor);
            }
        }

        // 8. VISIT_TIMES[HH]
        if let Some(hour) = item.hour() {
            self.module_mut(Module::VisitTimes)
                .entry(hour.to_string())
                .or_default()
                .record_hit(bytes, is_new_visitor, None);
        }

        outcome
    }
}

/// Coalesce a hit into a sub-item list by `data`, inserting a fresh entry in
/// first-seen order when absent (spec §4.2: "duplicate sub-item entries
/// within a single parent are coalesced by summing their counters").
fn merge_sub_item(sub_items: &mut Vec<SubItem>, data: &str, bytes: u64, is_new_visitor: bool) {
    if let Some(existing) = sub_items.iter_mut().find(|s| s.data == data) {
        existing.record_hit(bytes, is_new_visitor);
    } else {
        let mut sub = SubItem::new(data.to_string());
        sub.record_hit(bytes, is_new_visitor);
        sub_items.push(sub);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_classify::{ClassifierTables, GeoLookup};
    use vantage_types::GeoRecord;

    struct UnknownGeo;
    impl GeoLookup for UnknownGeo {
        fn lookup(&self, _host: &str) -> GeoRecord {
            GeoRecord::unknown()
        }
    }

    fn sample_item() -> LogItem {
        LogItem {
            host: Some("127.0.0.1".to_string()),
            date: Some("20150110".to_string()),
            time: Some("12:34:56".to_string()),
            request: Some("/index.html".to_string()),
            method: Some("GET".to_string()),
            protocol: Some("HTTP/1.1".to_string()),
            status: Some("200".to_string()),
            referrer: Some("https://www.google.com/search?q=hello+world".to_string()),
            user_agent: Some("Mozilla/5.0 (Windows NT 10.0) Chrome/90.0".to_string()),
            resp_size: 512,
            time_served_us: 1_500,
            ..Default::default()
        }
    }

    #[test]
    fn ingest_populates_core_modules() {
        let mut store = Store::new();
        let classifiers = ClassifierTables::default();
        let geo = UnknownGeo;

        let outcome = store.ingest(&sample_item(), &classifiers, &geo);

        assert_eq!(store.total_hits(Module::Visitors), 1);
        assert_eq!(store.total_hits(Module::Requests), 1);
        assert_eq!(store.total_hits(Module::Hosts), 1);
        assert_eq!(store.total_hits(Module::Os), 1);
        assert_eq!(store.total_hits(Module::Browsers), 1);
        assert_eq!(store.total_hits(Module::Referrers), 1);
        assert_eq!(store.total_hits(Module::ReferringSites), 1);
        assert_eq!(store.total_hits(Module::Keyphrases), 1);
        assert_eq!(store.total_hits(Module::StatusCodes), 1);
        assert_eq!(store.total_hits(Module::VisitTimes), 1);
        assert_eq!(outcome.new_hosts, vec!["127.0.0.1".to_string()]);
    }

    #[test]
    fn repeat_host_is_not_enqueued_twice() {
        let mut store = Store::new();
        let classifiers = ClassifierTables::default();
        let geo = UnknownGeo;

        let first = store.ingest(&sample_item(), &classifiers, &geo);
        let second = store.ingest(&sample_item(), &classifiers, &geo);
        assert_eq!(first.new_hosts.len(), 1);
        assert!(second.new_hosts.is_empty());
    }

    #[test]
    fn second_hit_from_same_visitor_key_does_not_bump_visitors() {
        let mut store = Store::new();
        let classifiers = ClassifierTables::default();
        let geo = UnknownGeo;

        store.ingest(&sample_item(), &classifiers, &geo);
        store.ingest(&sample_item(), &classifiers, &geo);

        let visitors = store.module(Module::Visitors).unwrap();
        let record = &visitors["20150110"];
        assert_eq!(record.hits, 2);
        assert_eq!(record.visitors, 1);
    }

    #[test]
    fn duplicate_sub_items_are_coalesced() {
        let mut store = Store::new();
        let classifiers = ClassifierTables::default();
        let geo = UnknownGeo;

        store.ingest(&sample_item(), &classifiers, &geo);
        store.ingest(&sample_item(), &classifiers, &geo);

        let status = store.module(Module::StatusCodes).unwrap();
        let entry = &status["2xx Success"];
        assert_eq!(entry.sub_items.len(), 1);
        assert_eq!(entry.sub_items[0].hits, 2);
    }
}
