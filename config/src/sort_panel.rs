use vantage_types::{ConfigError, Module, Sort, SortField, SortOrder};

/// Parse one `--sort-panel=MODULE,FIELD,ORDER` entry (spec §6).
pub fn parse_sort_panel_entry(raw: &str) -> Result<(Module, Sort), ConfigError> {
    let mut parts = raw.split(',');
    let module = parts.next().unwrap_or("").trim();
    let field = parts.next().unwrap_or("").trim();
    let order = parts.next().unwrap_or("").trim();

    if parts.next().is_some() || module.is_empty() || field.is_empty() || order.is_empty() {
        return Err(ConfigError::InvalidSort(raw.to_string()));
    }

    let module = module
        .parse::<Module>()
        .map_err(|_| ConfigError::InvalidSort(raw.to_string()))?;
    let field = parse_sort_field(field).ok_or_else(|| ConfigError::InvalidSort(raw.to_string()))?;
    let order = parse_sort_order(order).ok_or_else(|| ConfigError::InvalidSort(raw.to_string()))?;

    Ok((module, Sort::new(field, order)))
}

fn parse_sort_field(s: &str) -> Option<SortField> {
    Some(match s.to_ascii_uppercase().as_str() {
        "HITS" => SortField::Hits,
        "VISITORS" => SortField::Visitors,
        "DATA" => SortField::Data,
        "BW" => SortField::Bw,
        "USEC" => SortField::Usec,
        "PROT" => SortField::Prot,
        "MTHD" => SortField::Mthd,
        _ => return None,
    })
}

fn parse_sort_order(s: &str) -> Option<SortOrder> {
    Some(match s.to_ascii_uppercase().as_str() {
        "ASC" => SortOrder::Asc,
        "DESC" => SortOrder::Desc,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_entry() {
        let (module, sort) = parse_sort_panel_entry("REQUESTS,HITS,DESC").unwrap();
        assert_eq!(module, Module::Requests);
        assert_eq!(sort.field, SortField::Hits);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn rejects_malformed_entry() {
        assert!(parse_sort_panel_entry("REQUESTS,HITS").is_err());
        assert!(parse_sort_panel_entry("BOGUS,HITS,DESC").is_err());
        assert!(parse_sort_panel_entry("REQUESTS,BOGUS,DESC").is_err());
    }
}
