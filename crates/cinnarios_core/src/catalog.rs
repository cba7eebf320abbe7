//! crates/cinnarios_core/src/catalog.rs
//!
//! The in-memory collection of documentaries, events and magazines.
//!
//! The catalog is read-only for every caller except three mutation paths:
//! starring, commenting, and the registration ledger (which owns
//! `Event::registered_users`). Derived views are recomputed on every call.

use crate::domain::{
    Artist, Comment, CommentAuthor, Documentary, DocumentaryType, Event, EventStatus, Magazine,
    MagazineArticle,
};
use crate::error::{CoreError, CoreResult};
use crate::ports::Clock;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Result of [`Catalog::toggle_star`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarToggle {
    pub starred: bool,
    pub stars: u64,
}

pub struct Catalog {
    documentaries: Vec<Documentary>,
    events: Vec<Event>,
    magazines: Vec<Magazine>,
    /// Documentaries starred from this client.
    starred: HashSet<String>,
    clock: Arc<dyn Clock>,
}

impl Catalog {
    pub fn new(
        documentaries: Vec<Documentary>,
        events: Vec<Event>,
        magazines: Vec<Magazine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            documentaries,
            events,
            magazines,
            starred: HashSet::new(),
            clock,
        }
    }

    /// A catalog loaded with the bundled mock content.
    pub fn seeded(clock: Arc<dyn Clock>) -> Self {
        Self::new(seed_documentaries(), seed_events(), seed_magazines(), clock)
    }

    //=====================================================================================
    // Reads
    //=====================================================================================

    pub fn documentaries(&self) -> &[Documentary] {
        &self.documentaries
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn magazines(&self) -> &[Magazine] {
        &self.magazines
    }

    pub fn documentary(&self, id: &str) -> Option<&Documentary> {
        self.documentaries.iter().find(|doc| doc.id == id)
    }

    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    pub(crate) fn event_mut(&mut self, id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|event| event.id == id)
    }

    pub fn featured_documentaries(&self) -> Vec<&Documentary> {
        self.documentaries.iter().filter(|doc| doc.featured).collect()
    }

    pub fn upcoming_events(&self) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| event.status == EventStatus::Upcoming)
            .collect()
    }

    /// Events the given user is registered for.
    pub fn user_events(&self, user_id: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|event| event.registered_users.contains(user_id))
            .collect()
    }

    pub fn event_categories(&self) -> BTreeSet<&str> {
        self.events.iter().map(|event| event.category.as_str()).collect()
    }

    /// Case-insensitive match on title or description, optionally narrowed to one type.
    pub fn search_documentaries(
        &self,
        query: &str,
        kind: Option<DocumentaryType>,
    ) -> Vec<&Documentary> {
        let query = query.to_lowercase();
        self.documentaries
            .iter()
            .filter(|doc| kind.map_or(true, |kind| doc.kind == kind))
            .filter(|doc| {
                doc.title.to_lowercase().contains(&query)
                    || doc.description.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Case-insensitive match on title or location, optionally narrowed to one category.
    pub fn search_events(&self, query: &str, category: Option<&str>) -> Vec<&Event> {
        let query = query.to_lowercase();
        self.events
            .iter()
            .filter(|event| category.map_or(true, |category| event.category == category))
            .filter(|event| {
                event.title.to_lowercase().contains(&query)
                    || event.location.to_lowercase().contains(&query)
            })
            .collect()
    }

    pub fn is_starred(&self, documentary_id: &str) -> bool {
        self.starred.contains(documentary_id)
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    pub fn star(&mut self, documentary_id: &str) -> CoreResult<u64> {
        let doc = self.documentary_mut(documentary_id)?;
        doc.stars += 1;
        let stars = doc.stars;
        self.starred.insert(documentary_id.to_string());
        Ok(stars)
    }

    /// Removes a star. The count never drops below zero.
    pub fn unstar(&mut self, documentary_id: &str) -> CoreResult<u64> {
        let doc = self.documentary_mut(documentary_id)?;
        doc.stars = doc.stars.saturating_sub(1);
        let stars = doc.stars;
        self.starred.remove(documentary_id);
        Ok(stars)
    }

    pub fn toggle_star(&mut self, documentary_id: &str) -> CoreResult<StarToggle> {
        let starred = !self.is_starred(documentary_id);
        let stars = if starred {
            self.star(documentary_id)?
        } else {
            self.unstar(documentary_id)?
        };
        debug!(documentary_id, starred, stars, "Toggled star");
        Ok(StarToggle { starred, stars })
    }

    /// Appends a comment and returns its freshly generated id.
    pub fn add_comment(
        &mut self,
        documentary_id: &str,
        author: CommentAuthor,
        text: &str,
    ) -> CoreResult<String> {
        let content = text.trim();
        if content.is_empty() {
            return Err(CoreError::Validation("Comment cannot be empty".to_string()));
        }

        let created_at = self.clock.now();
        let doc = self.documentary_mut(documentary_id)?;
        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            user_id: author.user_id,
            username: author.username,
            content: content.to_string(),
            created_at,
        };
        let id = comment.id.clone();
        doc.comments.push(comment);
        Ok(id)
    }

    fn documentary_mut(&mut self, id: &str) -> CoreResult<&mut Documentary> {
        self.documentaries
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("documentary {id}")))
    }
}

//=========================================================================================
// Bundled Mock Content
//=========================================================================================

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn midnight(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    date(year, month, day).and_time(NaiveTime::MIN).and_utc()
}

fn tags(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|tag| tag.to_string()).collect()
}

fn seed_documentaries() -> Vec<Documentary> {
    vec![
        Documentary {
            id: "1".to_string(),
            title: "The Rise of Nollywood: A Creative Revolution".to_string(),
            description: "Explore the journey of Nigeria's booming film industry and the creative minds behind its success.".to_string(),
            artist: Artist {
                name: "Kemi Adetiba".to_string(),
                profession: "Film Director & Producer".to_string(),
                country: "Nigeria".to_string(),
                bio: "Award-winning director known for groundbreaking Nigerian films".to_string(),
            },
            kind: DocumentaryType::Video,
            duration: Some("45:30".to_string()),
            tags: tags(&["Film", "Nigeria", "Cinema", "Directing"]),
            views: 15420,
            stars: 892,
            comments: Vec::new(),
            created_at: midnight(2024, 1, 15),
            featured: true,
        },
        Documentary {
            id: "2".to_string(),
            title: "Designing Africa: The Future of Digital Art".to_string(),
            description: "Meet the designers reshaping Africa's digital landscape through innovative design thinking.".to_string(),
            artist: Artist {
                name: "Sarah Owusu".to_string(),
                profession: "Digital Designer & Creative Director".to_string(),
                country: "Ghana".to_string(),
                bio: "Pioneering digital artist creating stunning visual experiences".to_string(),
            },
            kind: DocumentaryType::Article,
            duration: None,
            tags: tags(&["Design", "Digital Art", "Ghana", "Innovation"]),
            views: 8920,
            stars: 456,
            comments: Vec::new(),
            created_at: midnight(2024, 1, 10),
            featured: true,
        },
        Documentary {
            id: "3".to_string(),
            title: "Sound of the Continent: African Music Production".to_string(),
            description: "Discover the producers and sound engineers behind Africa's biggest hits.".to_string(),
            artist: Artist {
                name: "DJ Maphorisa".to_string(),
                profession: "Music Producer & DJ".to_string(),
                country: "South Africa".to_string(),
                bio: "Grammy-nominated producer revolutionizing African music".to_string(),
            },
            kind: DocumentaryType::Video,
            duration: Some("38:15".to_string()),
            tags: tags(&["Music", "Production", "South Africa", "DJ"]),
            views: 12350,
            stars: 678,
            comments: Vec::new(),
            created_at: midnight(2024, 1, 5),
            featured: false,
        },
    ]
}

fn seed_events() -> Vec<Event> {
    vec![
        Event {
            id: "1".to_string(),
            title: "African Creative Summit 2024".to_string(),
            description: "Join the biggest gathering of African creatives in Lagos".to_string(),
            location: "Lagos, Nigeria".to_string(),
            date: date(2024, 3, 15),
            time: "09:00 AM".to_string(),
            organizer: "African Creative Network".to_string(),
            category: "Conference".to_string(),
            price: 150,
            capacity: 500,
            registered_users: BTreeSet::new(),
            status: EventStatus::Upcoming,
            tags: tags(&["Conference", "Networking", "Lagos"]),
        },
        Event {
            id: "2".to_string(),
            title: "Nollywood Film Festival".to_string(),
            description: "Celebrating the best of Nigerian cinema".to_string(),
            location: "Abuja, Nigeria".to_string(),
            date: date(2024, 4, 20),
            time: "06:00 PM".to_string(),
            organizer: "Nollywood Foundation".to_string(),
            category: "Film Festival".to_string(),
            price: 75,
            capacity: 300,
            registered_users: BTreeSet::new(),
            status: EventStatus::Upcoming,
            tags: tags(&["Film", "Festival", "Cinema"]),
        },
    ]
}

fn seed_magazines() -> Vec<Magazine> {
    vec![Magazine {
        id: "1".to_string(),
        title: "Cinnarios Magazine - Issue 1".to_string(),
        issue: "January 2024".to_string(),
        publish_date: date(2024, 1, 1),
        articles: vec![
            MagazineArticle {
                id: "1".to_string(),
                title: "The Future of African Storytelling".to_string(),
                excerpt: "How digital platforms are revolutionizing African narratives".to_string(),
                author: "Aisha Bello".to_string(),
                read_time: "5 min read".to_string(),
            },
            MagazineArticle {
                id: "2".to_string(),
                title: "Design Trends in African Tech".to_string(),
                excerpt: "Exploring the unique design language of African tech startups".to_string(),
                author: "Kwame Asante".to_string(),
                read_time: "7 min read".to_string(),
            },
        ],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FixedClock;
    use proptest::prelude::*;

    fn catalog() -> Catalog {
        Catalog::seeded(Arc::new(FixedClock::at(2024, 3, 1, 12, 0, 0)))
    }

    fn author() -> CommentAuthor {
        CommentAuthor {
            user_id: "u-1".to_string(),
            username: "creative_user".to_string(),
        }
    }

    #[test]
    fn test_derived_views() {
        let mut catalog = catalog();
        let featured: Vec<_> = catalog.featured_documentaries().iter().map(|d| d.id.clone()).collect();
        assert_eq!(featured, vec!["1", "2"]);
        assert_eq!(catalog.upcoming_events().len(), 2);

        catalog.event_mut("2").unwrap().status = EventStatus::Canceled;
        let upcoming: Vec<_> = catalog.upcoming_events().iter().map(|e| e.id.clone()).collect();
        assert_eq!(upcoming, vec!["1"]);
    }

    #[test]
    fn test_toggle_star_round_trip() {
        let mut catalog = catalog();

        let on = catalog.toggle_star("1").unwrap();
        assert_eq!(on, StarToggle { starred: true, stars: 893 });
        assert!(catalog.is_starred("1"));

        let off = catalog.toggle_star("1").unwrap();
        assert_eq!(off, StarToggle { starred: false, stars: 892 });
        assert!(!catalog.is_starred("1"));
    }

    #[test]
    fn test_star_unknown_documentary() {
        let mut catalog = catalog();
        assert_eq!(
            catalog.toggle_star("missing"),
            Err(CoreError::NotFound("documentary missing".to_string()))
        );
        assert!(!catalog.is_starred("missing"));
    }

    #[test]
    fn test_add_comment_appends_in_order() {
        let mut catalog = catalog();
        let first = catalog.add_comment("3", author(), "Great beats").unwrap();
        let second = catalog.add_comment("3", author(), "  Loved it  ").unwrap();

        let comments = &catalog.documentary("3").unwrap().comments;
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, first);
        assert_eq!(comments[1].id, second);
        assert_eq!(comments[1].content, "Loved it");
        assert_ne!(first, second);
    }

    #[test]
    fn test_add_comment_rejects_empty_text() {
        let mut catalog = catalog();
        let result = catalog.add_comment("3", author(), "   ");
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(catalog.documentary("3").unwrap().comments.is_empty());
    }

    #[test]
    fn test_search() {
        let catalog = catalog();
        let videos = catalog.search_documentaries("africa", Some(DocumentaryType::Video));
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].id, "3");

        assert_eq!(catalog.search_events("ABUJA", None).len(), 1);
        assert_eq!(catalog.search_events("", Some("Conference")).len(), 1);
        assert!(catalog.search_events("lagos", Some("Film Festival")).is_empty());
    }

    proptest! {
        #[test]
        fn test_stars_never_negative(start in 0u64..4, ops in proptest::collection::vec(any::<bool>(), 0..32)) {
            let clock = Arc::new(FixedClock::at(2024, 3, 1, 12, 0, 0));
            let mut docs = seed_documentaries();
            docs.truncate(1);
            docs[0].stars = start;
            let mut catalog = Catalog::new(docs, Vec::new(), Vec::new(), clock);

            let mut expected = start;
            for star in ops {
                let stars = if star {
                    expected += 1;
                    catalog.star("1").unwrap()
                } else {
                    expected = expected.saturating_sub(1);
                    catalog.unstar("1").unwrap()
                };
                prop_assert_eq!(stars, expected);
            }
        }
    }
}
