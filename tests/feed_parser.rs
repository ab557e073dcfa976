// tests/feed_parser.rs
use chrono::{TimeZone, Utc};
use news_aggregator::error::FetchError;
use news_aggregator::ingest::parser::parse_feed;

#[test]
fn rss_fixture_maps_to_items() {
    let xml = std::fs::read_to_string("tests/fixtures/rss.xml").expect("fixture");
    let items = parse_feed(&xml).expect("parse rss");
    assert_eq!(items.len(), 3);

    let first = &items[0];
    assert_eq!(first.title, "DeSantis Signs Budget Bill");
    assert_eq!(
        first.description,
        "Gov. Ron DeSantis signed the state budget on Wednesday."
    );
    assert_eq!(
        first.link,
        "https://www.nytimes.com/2024/05/01/us/desantis-budget.html"
    );
    assert_eq!(first.links, vec![first.link.clone()]);
    assert_eq!(first.authors, vec!["Patricia Mazzei".to_string()]);
    assert_eq!(
        first.categories,
        vec!["Politics and Government".to_string(), "Florida".to_string()]
    );
    assert_eq!(
        first.published,
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    );
    assert_eq!(first.language.as_deref(), Some("en-US"));

    let second = &items[1];
    assert_eq!(second.authors, vec!["Judson Jones".to_string()]);
    assert_eq!(second.description, "Forecasters warn of heavy rain & wind.");
    assert_eq!(
        second.published,
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap())
    );

    assert!(items[2].published.is_none(), "undated item keeps no timestamp");
}

#[test]
fn atom_fixture_maps_to_items() {
    let xml = std::fs::read_to_string("tests/fixtures/atom.xml").expect("fixture");
    let items = parse_feed(&xml).expect("parse atom");
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.title, "Le budget est voté");
    assert_eq!(first.description, "L'Assemblée a adopté le texte.");
    // alternate link wins over the enclosure
    assert_eq!(first.link, "https://www.lemonde.fr/politique/budget.html");
    assert_eq!(first.links.len(), 2);
    assert_eq!(first.authors, vec!["Claire Gatinois".to_string()]);
    assert_eq!(first.categories, vec!["Politique".to_string()]);
    assert_eq!(
        first.published,
        Some(Utc.with_ymd_and_hms(2024, 5, 1, 7, 15, 0).unwrap())
    );
    assert_eq!(first.language.as_deref(), Some("fr-FR"));

    let second = &items[1];
    assert_eq!(second.description, "Brève.");
    assert_eq!(second.link, "https://www.lemonde.fr/breves/1.html");
    // falls back to <updated>
    assert_eq!(
        second.published,
        Some(Utc.with_ymd_and_hms(2024, 4, 30, 8, 0, 0).unwrap())
    );
}

#[test]
fn rss_with_atom_and_media_elements_keeps_every_item() {
    let xml = std::fs::read_to_string("tests/fixtures/rss_media.xml").expect("fixture");
    let items = parse_feed(&xml).expect("parse namespaced rss");
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.title, "DeSantis Vetoes Social Media Bill");
    assert_eq!(first.description, "The governor rejected the measure on Friday.");
    assert_eq!(
        first.link,
        "https://www.nytimes.com/2024/03/01/us/desantis-veto.html"
    );
    // the standout href repeats the link
    assert_eq!(first.links, vec![first.link.clone()]);
    assert_eq!(
        first.authors,
        vec!["Patricia Mazzei".to_string(), "Nicholas Nehamas".to_string()]
    );
    assert_eq!(first.categories, vec!["DeSantis, Ron".to_string()]);
    assert_eq!(first.language.as_deref(), Some("en-US"));

    // no text link: the atom href is used
    let second = &items[1];
    assert_eq!(
        second.link,
        "https://www.nytimes.com/2024/03/02/us/atom-only.html"
    );
    assert!(!second.description.is_empty());
    assert_eq!(
        second.published,
        Some(Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap())
    );
}

#[test]
fn atom_with_media_content_keeps_the_entry_body() {
    let xml = std::fs::read_to_string("tests/fixtures/atom_media.xml").expect("fixture");
    let items = parse_feed(&xml).expect("parse atom with media");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Storm Isha batters coast");
    assert_eq!(items[0].description, "Gusts reached 90mph overnight.");
    assert_eq!(items[0].link, "https://www.bbc.co.uk/news/uk-1");
    assert_eq!(items[0].authors, vec!["Jane Reporter".to_string()]);
    assert_eq!(items[0].language.as_deref(), Some("en-GB"));
}

#[test]
fn garbage_is_a_parse_error() {
    assert!(matches!(parse_feed("not xml at all"), Err(FetchError::Parse(_))));
    assert!(matches!(parse_feed(""), Err(FetchError::Parse(_))));
}
