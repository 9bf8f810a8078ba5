use vantage_types::{Module, SortField};

/// The sort fields a given module's snapshot may legally be ordered by
/// (spec §4.4: "legal combinations are tabulated per module").
///
/// `PROT`/`MTHD` only make sense for the request-shaped modules that carry a
/// method/protocol on their `MetricsRecord` (spec §3); modules whose key is
/// purely a counted label (dates, hours, continents) never carry those
/// fields and so can't be sorted by them.
#[must_use]
pub fn legal_sort_fields(module: Module) -> &'static [SortField] {
    use SortField::{Bw, Data, Hits, Mthd, Prot, Usec, Visitors};

    match module {
        Module::Requests | Module::RequestsStatic | Module::NotFound => {
            &[Hits, Visitors, Data, Bw, Usec, Prot, Mthd]
        }
        Module::Hosts => &[Hits, Visitors, Data, Bw, Usec],
        Module::Visitors
        | Module::Os
        | Module::Browsers
        | Module::VisitTimes
        | Module::Referrers
        | Module::ReferringSites
        | Module::Keyphrases
        | Module::GeoLocation
        | Module::StatusCodes => &[Hits, Visitors, Data, Bw],
    }
}

#[must_use]
pub fn is_legal_sort(module: Module, field: SortField) -> bool {
    legal_sort_fields(module).contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_allow_method_and_protocol() {
        assert!(is_legal_sort(Module::Requests, SortField::Mthd));
        assert!(is_legal_sort(Module::Requests, SortField::Prot));
    }

    #[test]
    fn visitors_reject_method_and_protocol() {
        assert!(!is_legal_sort(Module::Visitors, SortField::Mthd));
        assert!(!is_legal_sort(Module::Visitors, SortField::Prot));
    }

    #[test]
    fn every_module_allows_hits() {
        for module in Module::ALL {
            assert!(is_legal_sort(module, SortField::Hits));
        }
    }
}
