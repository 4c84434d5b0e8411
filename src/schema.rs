use serde_json::{json, Map, Value};

use crate::analysis::{MAX_GRAM, MIN_GRAM};

/// Name of the custom analyzer declared in the index settings.
pub const AUTOCOMPLETE_ANALYZER: &str = "autocomplete";

/// Search-time analyzer: the same tokens as `autocomplete`, truncated to the
/// longest stored gram instead of expanded into prefixes.
pub const AUTOCOMPLETE_SEARCH_ANALYZER: &str = "autocomplete_search";

/// Text fields that carry the autocomplete analyzer.
pub const TEXT_FIELDS: [&str; 5] = ["id", "cp", "colonia", "ciudad", "delegacion"];

/// Keyword sub-field used to sort results by neighborhood.
pub const COLONIA_SORT_FIELD: &str = "colonia.raw";

/// Index creation body: analysis settings plus field mappings.
///
/// With a legacy `doc_type` the properties are nested under the type name,
/// as Elasticsearch 5/6 expects.
pub fn index_schema(doc_type: Option<&str>) -> Value {
    let settings = json!({
        "index": {
            "analysis": {
                "analyzer": {
                    AUTOCOMPLETE_ANALYZER: {
                        "tokenizer": "whitespace",
                        "filter": ["lowercase", "engram"]
                    },
                    AUTOCOMPLETE_SEARCH_ANALYZER: {
                        "tokenizer": "whitespace",
                        "filter": ["lowercase", "truncate_gram"]
                    }
                },
                "filter": {
                    "engram": {
                        "type": "edge_ngram",
                        "min_gram": MIN_GRAM,
                        "max_gram": MAX_GRAM
                    },
                    "truncate_gram": {
                        "type": "truncate",
                        "length": MAX_GRAM
                    }
                }
            }
        }
    });

    let mappings = match doc_type {
        Some(name) => {
            let mut typed = Map::new();
            typed.insert(name.to_string(), type_mapping());
            Value::Object(typed)
        }
        None => type_mapping(),
    };

    json!({ "settings": settings, "mappings": mappings })
}

fn type_mapping() -> Value {
    let mut properties = Map::new();
    for field in TEXT_FIELDS {
        let mut mapping = json!({
            "type": "text",
            "store": true,
            "analyzer": AUTOCOMPLETE_ANALYZER,
            "search_analyzer": AUTOCOMPLETE_SEARCH_ANALYZER
        });
        if field == "colonia" {
            mapping["fielddata"] = json!(true);
            mapping["fields"] = json!({ "raw": { "type": "keyword" } });
        }
        properties.insert(field.to_string(), mapping);
    }
    properties.insert("location".to_string(), json!({ "type": "geo_point" }));
    json!({ "properties": properties })
}
