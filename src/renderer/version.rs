use std::cmp::Ordering;

/// Compares two dotted-numeric product-version strings: split on `.`,
/// compare each component numerically, treat a missing trailing component
/// as `0`, and fall back to a plain byte-lexicographic compare the first
/// time a component on either side is not purely numeric (e.g. a
/// pre-release suffix).
pub fn compare_product_versions(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => {
                let l = l.unwrap_or("0");
                let r = r.unwrap_or("0");
                match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(ln), Ok(rn)) => match ln.cmp(&rn) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    },
                    _ => return a.cmp(b),
                }
            }
        }
    }
}

/// Is `server` older than `client` per [`compare_product_versions`]?
pub fn server_is_older(client: &str, server: &str) -> bool {
    compare_product_versions(client, server) == Ordering::Greater
}
