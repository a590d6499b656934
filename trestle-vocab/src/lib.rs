//! Well-known vocabulary IRIs shared across the trestle crates.
//!
//! Constants are grouped by namespace so call sites read as
//! `xsd::INTEGER` or `rdf::TYPE`, mirroring the prefixed names they
//! stand for.

/// RDF core vocabulary (`rdf:` prefix).
pub mod rdf {
    /// rdf:type IRI
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

    /// rdf:langString IRI (datatype of language-tagged literals)
    pub const LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

    /// rdf namespace prefix
    pub const NAMESPACE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
}

/// XML Schema datatype vocabulary (`xsd:` prefix).
pub mod xsd {
    /// xsd:string IRI
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

    /// xsd:boolean IRI
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";

    /// xsd:integer IRI
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";

    /// xsd:decimal IRI
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";

    /// xsd:double IRI
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

    /// xsd:float IRI
    pub const FLOAT: &str = "http://www.w3.org/2001/XMLSchema#float";

    /// xsd:long IRI
    pub const LONG: &str = "http://www.w3.org/2001/XMLSchema#long";

    /// xsd:int IRI
    pub const INT: &str = "http://www.w3.org/2001/XMLSchema#int";

    /// xsd:short IRI
    pub const SHORT: &str = "http://www.w3.org/2001/XMLSchema#short";

    /// xsd:byte IRI
    pub const BYTE: &str = "http://www.w3.org/2001/XMLSchema#byte";

    /// xsd:unsignedLong IRI
    pub const UNSIGNED_LONG: &str = "http://www.w3.org/2001/XMLSchema#unsignedLong";

    /// xsd:unsignedInt IRI
    pub const UNSIGNED_INT: &str = "http://www.w3.org/2001/XMLSchema#unsignedInt";

    /// xsd:unsignedShort IRI
    pub const UNSIGNED_SHORT: &str = "http://www.w3.org/2001/XMLSchema#unsignedShort";

    /// xsd:unsignedByte IRI
    pub const UNSIGNED_BYTE: &str = "http://www.w3.org/2001/XMLSchema#unsignedByte";

    /// xsd:nonNegativeInteger IRI
    pub const NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";

    /// xsd:nonPositiveInteger IRI
    pub const NON_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonPositiveInteger";

    /// xsd:positiveInteger IRI
    pub const POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";

    /// xsd:negativeInteger IRI
    pub const NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#negativeInteger";

    /// xsd namespace prefix
    pub const NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema#";
}

/// Extended aggregate function IRIs served by the query engine.
pub mod agg {
    /// Namespace reserved for extended aggregate functions
    pub const NAMESPACE: &str = "https://ns.trestle.dev/aggregate#";

    /// agg:median IRI
    pub const MEDIAN: &str = "https://ns.trestle.dev/aggregate#median";

    /// agg:variance IRI (population variance)
    pub const VARIANCE: &str = "https://ns.trestle.dev/aggregate#variance";

    /// agg:stddev IRI (population standard deviation)
    pub const STDDEV: &str = "https://ns.trestle.dev/aggregate#stddev";

    /// agg:mode IRI
    pub const MODE: &str = "https://ns.trestle.dev/aggregate#mode";

    /// Prefix of the percentile family, completed by an integer
    /// percentile in 0..=100 (`agg:percentile25`, `agg:percentile90`)
    pub const PERCENTILE_PREFIX: &str = "https://ns.trestle.dev/aggregate#percentile";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agg_constants_share_namespace() {
        for iri in [agg::MEDIAN, agg::VARIANCE, agg::STDDEV, agg::MODE] {
            assert!(iri.starts_with(agg::NAMESPACE), "{iri} outside namespace");
        }
        assert!(agg::PERCENTILE_PREFIX.starts_with(agg::NAMESPACE));
    }

    #[test]
    fn xsd_constants_share_namespace() {
        assert!(xsd::INTEGER.starts_with(xsd::NAMESPACE));
        assert!(xsd::STRING.starts_with(xsd::NAMESPACE));
    }
}
