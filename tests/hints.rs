// tests/hints.rs
//
// Autocomplete reads over a provisioned in-memory store.

mod support;

use serde_json::json;
use std::sync::Arc;

use news_aggregator::domain::{CategoryDocument, PersonDocument};
use news_aggregator::registry::StaticRegistry;
use news_aggregator::store::mapping::{provision, seed_publishers};
use news_aggregator::store::{publisher_id, DocumentStore, IndexName, MemoryStore};
use news_aggregator::HintService;
use support::{publisher, source};

async fn provisioned() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    provision(store.as_ref(), false).await.expect("provision");
    store
}

#[tokio::test]
async fn publisher_hints_are_seeded_once_and_fuzzy_matched() {
    let store = provisioned().await;
    let nyt = publisher("The New York Times", "USA");
    let bbc = publisher("BBC", "United Kingdom");
    let lemonde = publisher("Le Monde", "France");
    let registry = StaticRegistry::new(vec![
        source(0, &nyt),
        source(1, &nyt),
        source(2, &bbc),
        source(3, &lemonde),
    ]);

    let seeded = seed_publishers(store.as_ref(), &registry, 2)
        .await
        .expect("seed");
    assert_eq!(seeded, 3);
    assert_eq!(store.doc_count(IndexName::Publishers), 3);

    let hints = HintService::new(store);
    let found = hints.publishers("Tmes").await.expect("publishers");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "The New York Times");
    assert_eq!(found[0].publisher_id, publisher_id("The New York Times"));

    let defaults = hints.publishers("").await.expect("default publishers");
    assert_eq!(defaults.len(), 3);
}

#[tokio::test]
async fn category_and_people_hints_match_partial_words() {
    let store = provisioned().await;
    for name in ["Politics", "Political Science", "Weather"] {
        store
            .index_category(&CategoryDocument { name: name.into() })
            .await
            .expect("category");
    }
    for full_name in ["Ron DeSantis", "Patricia Mazzei"] {
        store
            .index_person(&PersonDocument {
                full_name: full_name.into(),
            })
            .await
            .expect("person");
    }
    let hints = HintService::new(store);

    let mut cats: Vec<String> = hints
        .categories("POLI")
        .await
        .expect("categories")
        .into_iter()
        .map(|c| c.name)
        .collect();
    cats.sort();
    assert_eq!(cats, vec!["Political Science", "Politics"]);
    assert_eq!(hints.categories("").await.expect("all").len(), 3);

    let people = hints.people("desan").await.expect("people");
    assert_eq!(
        people,
        vec![PersonDocument {
            full_name: "Ron DeSantis".into()
        }]
    );
}

#[tokio::test]
async fn languages_fold_case_and_rank_by_count() {
    let store = provisioned().await;
    for (id, lang) in [("1", "en-US"), ("2", "EN-us"), ("3", "fr"), ("4", "en-US")] {
        let doc = json!({
            "name": format!("story {id}"),
            "language": lang,
            "datePublished": "2024-05-01T00:00:00Z",
        });
        store
            .index(IndexName::Articles, Some(id), &doc)
            .await
            .expect("index");
    }
    let hints = HintService::new(store);

    let langs: Vec<String> = hints
        .languages()
        .await
        .expect("languages")
        .into_iter()
        .map(|l| l.name)
        .collect();
    assert_eq!(langs, vec!["en-us", "fr"]);
}

#[tokio::test]
async fn hints_on_a_missing_index_are_errors() {
    let hints = HintService::new(Arc::new(MemoryStore::new()));
    assert!(hints.categories("x").await.is_err());
    assert!(hints.languages().await.is_err());
}
