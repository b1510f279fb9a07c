use housing_browse::browse::{to_query_string, to_summary, BrowseParams, FavoriteSort};
use housing_browse::models::{FilterSet, PropertyId};
use housing_browse::session::{BrowseSession, Notice, Notifier, SavedSearchBook};
use housing_browse::store::{MemoryPropertyRepository, Repositories};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }
}

const REMOTE_CATALOG: &str = r#"[
    {"Id": 11, "title": "Riverside Condo", "price": 310000, "address": "4 Water St",
     "city": "Austin", "state": "TX", "zip_code": "78701", "property_type": "Condo",
     "bedrooms": 2, "bathrooms": 2, "square_feet": 1000, "features": "Balcony,Pool",
     "images": "https://images.example.com/11.jpg", "status": "active"},
    {"Id": 12, "title": "Hill Country House", "price": 540000, "address": "77 Ranch Rd",
     "city": "Dripping Springs", "state": "TX", "zip_code": "78620", "property_type": "House",
     "bedrooms": 4, "bathrooms": 3, "square_feet": 2900,
     "images": "https://images.example.com/12.jpg"}
]"#;

#[tokio::test]
async fn saved_search_replays_into_browse() {
    let notifier = Arc::new(CollectingNotifier::default());
    let repos = Repositories::sample().unwrap();

    let mut book = SavedSearchBook::new(&repos, notifier.clone());
    let filters = FilterSet {
        location: "Austin".to_string(),
        price_min: "200000".to_string(),
        property_types: vec!["House".to_string()],
        bedrooms_min: "3".to_string(),
        ..FilterSet::default()
    };
    let saved = book.create("Austin houses", filters.clone()).await.unwrap();
    assert_eq!(
        to_summary(&saved.filters),
        "Location: Austin • Price: $200,000 -  • Type: House • 3+ beds"
    );

    let path = book.run(&saved.id).unwrap();
    let query_string = path.strip_prefix("/browse?").unwrap();
    assert_eq!(query_string, to_query_string(&filters));

    let mut session = BrowseSession::new(&repos, notifier.clone());
    session.load().await.unwrap();
    session.apply_params(BrowseParams::from_query_string(query_string));
    assert_eq!(session.filters(), &filters);

    let visible = session.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Family House with Pool");

    let id = visible[0].id.clone();
    session.toggle_favorite(&id).await.unwrap();
    assert!(session.is_favorite(&id));

    let listings = session.favorite_listings(FavoriteSort::Newest);
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].property.id, id);

    let notices = notifier.notices.lock().unwrap();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(Notice::is_success));
    assert_eq!(notices[1].subject, "Family House with Pool");
}

#[tokio::test]
async fn remote_convention_catalog_browses_like_mock() {
    let mut repos = Repositories::sample().unwrap();
    repos.properties = Arc::new(MemoryPropertyRepository::from_json(REMOTE_CATALOG).unwrap());

    let notifier = Arc::new(CollectingNotifier::default());
    let mut session = BrowseSession::new(&repos, notifier);
    session.load().await.unwrap();
    session.set_query("tx");
    session.filters_mut().toggle_property_type("Condo");

    let visible = session.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, PropertyId::from(11));
    assert_eq!(visible[0].features, vec!["Balcony", "Pool"]);
}
