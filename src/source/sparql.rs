use std::collections::HashMap;
use std::time::Duration;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tracing::{debug, info};
use crate::core::error::{Error, ErrorKind, Result};
use crate::source::annotation::{AnnotationCache, AnnotationSource};

const RESULTS_JSON: &str = "application/sparql-results+json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

const PREFIXES: &str = "\
PREFIX gnt: <http://genenetwork.org/term/>
PREFIX gnc: <http://genenetwork.org/category/>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
";

const ANNOTATION_QUERY: &str = "\
SELECT ?speciesName ?symbolName (GROUP_CONCAT(DISTINCT ?comment ; separator=\"\\n\") AS ?comment)
WHERE {
    ?symbol rdfs:comment _:node ;
            rdfs:label ?symbolName .
    _:node rdf:type gnc:GNWikiEntry ;
           gnt:belongsToSpecies ?species ;
           rdfs:comment ?comment .
    ?species gnt:shortName ?speciesName .
}
GROUP BY ?speciesName ?symbolName
";

const HASH_QUERY: &str = "\
SELECT (MD5(GROUP_CONCAT(?comment ; separator=\"\")) AS ?hash)
WHERE {
    SELECT ?comment WHERE {
        ?symbol rdfs:comment _:node .
        _:node rdf:type gnc:GNWikiEntry ;
               rdfs:comment ?comment .
    }
    ORDER BY ?comment
}
";

#[derive(Debug, Deserialize)]
struct QueryResults {
    results: Bindings,
}

#[derive(Debug, Deserialize)]
struct Bindings {
    bindings: Vec<HashMap<String, Term>>,
}

#[derive(Debug, Deserialize)]
struct Term {
    value: String,
}

type Solution = HashMap<String, Term>;

/// Annotation source backed by a SPARQL endpoint.
pub struct SparqlSource {
    endpoint: String,
    client: Client,
}

impl SparqlSource {
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(SparqlSource {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    fn select(&self, query: &str) -> Result<Vec<Solution>> {
        let query = format!("{}{}", PREFIXES, query);
        debug!(endpoint = %self.endpoint, "running SPARQL query");
        let results: QueryResults = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, RESULTS_JSON)
            .form(&[("query", query.as_str())])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(results.results.bindings)
    }
}

fn binding<'a>(solution: &'a Solution, name: &str) -> Option<&'a str> {
    solution.get(name).map(|term| term.value.as_str())
}

fn annotation_entries(solutions: Vec<Solution>) -> AnnotationCache {
    solutions
        .iter()
        .filter_map(|s| {
            Some((
                binding(s, "speciesName")?.to_string(),
                binding(s, "symbolName")?.to_string(),
                binding(s, "comment")?.to_string(),
            ))
        })
        .collect()
}

fn dataset_hash_of(solutions: Vec<Solution>) -> Result<String> {
    solutions
        .first()
        .and_then(|s| binding(s, "hash"))
        .map(str::to_string)
        .ok_or_else(|| Error::new(ErrorKind::Parse, "annotation hash query returned no hash".into()))
}

impl AnnotationSource for SparqlSource {
    fn annotations(&self) -> Result<AnnotationCache> {
        let cache = annotation_entries(self.select(ANNOTATION_QUERY)?);
        info!(entries = cache.len(), "loaded annotation cache");
        Ok(cache)
    }

    fn dataset_hash(&self) -> Result<String> {
        dataset_hash_of(self.select(HASH_QUERY)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<Solution> {
        serde_json::from_str::<QueryResults>(json).unwrap().results.bindings
    }

    #[test]
    fn annotation_bindings_build_the_cache() {
        let solutions = parse(
            r#"{
              "head": {"vars": ["speciesName", "symbolName", "comment"]},
              "results": {"bindings": [
                {"speciesName": {"type": "literal", "value": "mouse"},
                 "symbolName": {"type": "literal", "value": "Shh"},
                 "comment": {"type": "literal", "value": "limb patterning"}},
                {"speciesName": {"type": "literal", "value": "rat"},
                 "symbolName": {"type": "literal", "value": "Ace"}}
              ]}
            }"#,
        );
        let cache = annotation_entries(solutions);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("mouse", "Shh"), Some("limb patterning"));
    }

    #[test]
    fn hash_is_first_binding() {
        let solutions = parse(
            r#"{"results": {"bindings": [{"hash": {"type": "literal", "value": "d41d8cd9"}}]}}"#,
        );
        assert_eq!(dataset_hash_of(solutions).unwrap(), "d41d8cd9");

        let err = dataset_hash_of(parse(r#"{"results": {"bindings": []}}"#)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
    }
}
