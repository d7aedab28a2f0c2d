//! Corpus generation: embed the curated seed catalogs and write the files
//! the dialogue engine loads at startup.
//!
//! Regeneration is idempotent and overwrites the three embedding files. The
//! station facts dataset is only seeded when missing, so curated edits to it
//! survive a re-run.

use std::collections::BTreeMap;
use std::fs;

use ridewise_config::Config;
use ridewise_core::EmbeddingProvider;
use ridewise_nlu::corpus::{DOMAIN_FILE, FACTS_FILE, FIELDS_FILE, INTENTS_FILE};
use serde_json::json;
use tracing::info;

use super::{CommandStrategy, build_provider};

/// Prose description of everything the assistant covers. Its embedding is
/// the domain reference vector the relevance gate compares queries against.
const DOMAIN_REFERENCE_TEXT: &str = "\
The regional rapid transit network serves the Bay Area with fast, frequent \
train service connecting San Francisco, Oakland, Berkeley and neighboring \
cities across several color-coded lines.

Stations such as MacArthur, Fruitvale and Oakland offer daily parking, EV \
charging spots and carpool parking options. Most stations are equipped with \
bike racks and bike lockers so commuters can safely store their bicycles.

Station parking lots accept different payment methods, including cash, \
credit cards and transit cards, which can be used to pay parking fees. Some \
stations offer monthly parking permits for subscribers.

Beyond parking, stations provide ticket vending machines, real-time train \
schedule information, service alerts, and connections to buses and ferries. \
Accessibility features include elevators, ramps and priority seating.

Train schedules vary by time of day, with peak frequencies every few minutes \
in the morning and evening commute windows.";

/// Intent label → exemplar questions. Bracketed placeholders stand in for a
/// station name, matching how riders actually phrase these.
const INTENT_SEEDS: &[(&str, &[&str])] = &[
    (
        "events_and_activities",
        &[
            "What events are happening near [station name] this weekend?",
            "Are there any concerts near [station name]?",
            "Tell me about festivals near a station.",
        ],
    ),
    (
        "restaurants_and_dining",
        &[
            "What are the best restaurants near [station name]?",
            "Where can I get coffee near [station name]?",
            "Find a family-friendly restaurant near a station.",
        ],
    ),
    (
        "sports_and_entertainment",
        &[
            "How do I get to the ballpark by train?",
            "Where can I watch a basketball game near a station?",
            "Find a live music venue near a station.",
        ],
    ),
    (
        "general_parking_information",
        &[
            "Does [station name] have parking facilities?",
            "Is the parking lot open to the public or only for specific users?",
            "How many parking spots are available at [station name]?",
            "What is the parking cost at [station name]?",
            "What is the time limit for a parking spot after payment?",
            "Can I pre-book a parking spot at [station name]?",
        ],
    ),
    (
        "types_of_parking",
        &[
            "What types of parking are available at [station name]?",
            "Does [station name] have EV parking spots?",
            "Is there designated parking for carpool vehicles?",
            "Are there multi-day or long-term parking options?",
            "Is public parking available?",
            "Is there any special kind of parking for the disabled?",
        ],
    ),
    (
        "daily_multiday_monthly_ev_parking",
        &[
            "What is the cost of daily parking at [station name]?",
            "Are there any discounts available for daily parking at [station name]?",
            "What is the cost of multi-day parking at [station name]?",
            "What are the monthly parking hours at [station name]?",
            "Is there free EV parking at [station name]?",
        ],
    ),
    (
        "general_service_alerts",
        &[
            "Are there any service alerts right now?",
            "Can you show me the latest service updates?",
            "Are there any planned maintenance or service disruptions?",
            "Are there any station closures or delays I should be aware of?",
        ],
    ),
    (
        "elevator_escalator_alerts",
        &[
            "Are there any elevator outages at [station name]?",
            "Are there any elevator service alerts today?",
            "How can I check if station elevators are operational?",
        ],
    ),
    (
        "station_schedule",
        &[
            "Are there any delays or service disruptions at [station name]?",
            "What time does the first and last train depart from [station name] on weekends?",
            "How frequently do trains depart from [station name] during peak hours?",
            "Does the schedule change on holidays at [station name]?",
        ],
    ),
    (
        "specific_time_schedule",
        &[
            "What is the earliest train from [station name] on weekdays?",
            "What time does the last train leave [station name] tonight?",
            "Are there late-night or overnight trains from [station name]?",
        ],
    ),
    (
        "route_schedule",
        &[
            "What is the schedule for trains from [station A] to [station B]?",
            "How many stops are there between [station A] and [station B]?",
            "Are there direct trains between [station A] and [station B]?",
        ],
    ),
    (
        "real_time_train_status",
        &[
            "What is the real-time status of the next train?",
            "Is the train delayed?",
            "What is the next available train from [station name]?",
        ],
    ),
    (
        "transit_connections",
        &[
            "Fastest route to the airport from [station name]?",
            "What is the walking time to the nearest bus stop from [station name]?",
            "Are there bike-share options near [station name]?",
            "What are the next available bus options from [station name]?",
        ],
    ),
];

/// Field key → the phrasing that gets embedded. `_altN` keys are variant
/// phrasings of the same underlying attribute.
const FIELD_SEEDS: &[(&str, &str)] = &[
    ("has_parking", "Does the station have parking facilities?"),
    ("has_parking_alt1", "Is parking available at the station?"),
    ("has_parking_alt2", "Can I park my car at the station?"),
    ("public_access", "Is the parking lot open to the public?"),
    (
        "public_access_alt1",
        "Is the parking lot open to the public or only for specific users?",
    ),
    ("public_access_alt2", "Can anyone use it?"),
    ("public_access_alt3", "Is parking restricted at the station?"),
    ("pre_booking_available", "Can I pre-book a parking spot?"),
    (
        "pre_booking_available_alt1",
        "Do I need to reserve a parking spot in advance?",
    ),
    (
        "pre_booking_available_alt2",
        "Is parking first-come, first-served at the station?",
    ),
    ("parking_cost", "What is the parking cost?"),
    ("parking_cost_alt1", "How much does parking cost at the station?"),
    ("parking_cost_alt2", "Are there any parking fees at the station?"),
    (
        "time_limit",
        "What is the time limit for a parking spot after payment?",
    ),
    ("time_limit_alt1", "How long can I park after paying?"),
    ("time_limit_alt2", "Is there a maximum parking duration?"),
    ("available_spots", "How many parking spots are available?"),
    ("available_spots_alt1", "Is there parking available right now?"),
    ("total_spots", "What is the total parking capacity at the station?"),
    ("bike_parking", "Is parking available for both cars and bikes?"),
    (
        "ev_parking",
        "Are there separate parking areas for electric vehicles?",
    ),
    ("24_7_access", "Is parking available 24/7?"),
    ("permit_required", "Do I need a permit to park here?"),
    (
        "restrictions",
        "Are there any restrictions on who can park at this lot?",
    ),
    ("booking_method", "How can I book a parking spot in advance?"),
    ("app_booking", "Is there a mobile app for booking parking?"),
    ("discounts", "Are there any discounts for long-term parking?"),
    (
        "payment_methods",
        "Can I pay for parking using cash, card, or mobile payment?",
    ),
    (
        "monthly_pass",
        "Is there an option for a monthly or weekly parking pass?",
    ),
    ("free_hours", "Are there any free parking hours or grace periods?"),
    (
        "overstay_penalty",
        "Is there a penalty for overstaying in a parking spot?",
    ),
    (
        "disabled_spots",
        "Are there designated parking spots for people with disabilities?",
    ),
    (
        "real_time_check",
        "How can I check real-time parking availability?",
    ),
];

/// Starter dataset so a fresh install answers something sensible.
const STARTER_FACTS: &str = r#"{
  "MacArthur": {
    "has_parking": "Yes, a dedicated lot with daily and permit parking",
    "public_access": "Open to the public during operating hours",
    "pre_booking_available": "Yes, through the official parking app",
    "parking_cost": "$3 per day",
    "time_limit": "24 hours after payment",
    "available_spots": "480",
    "total_spots": "603",
    "bike_parking": "Yes, racks and electronic lockers",
    "ev_parking": "Yes, 8 charging stalls on level 1",
    "payment_methods": "Cash, credit card, or transit card",
    "disabled_spots": "Yes, near the main entrance",
    "discounts": null,
    "free_hours": null
  },
  "Fruitvale": {
    "has_parking": "Yes, surface lot adjacent to the station",
    "public_access": "Open to the public",
    "pre_booking_available": "No, first-come first-served",
    "parking_cost": "$3 per day",
    "time_limit": "24 hours after payment",
    "available_spots": null,
    "total_spots": "1143",
    "bike_parking": "Yes, staffed bike station",
    "ev_parking": null,
    "payment_methods": "Cash or transit card",
    "disabled_spots": "Yes, two rows by the east gate",
    "discounts": null,
    "free_hours": null
  },
  "Oakland": {
    "has_parking": "No dedicated lot; nearby city garages only",
    "public_access": "City garages are open to the public",
    "pre_booking_available": null,
    "parking_cost": null,
    "time_limit": null,
    "available_spots": "80",
    "total_spots": null,
    "bike_parking": "Yes, racks at street level",
    "ev_parking": null,
    "payment_methods": "Garage-dependent",
    "disabled_spots": "Street-level accessible spaces",
    "discounts": null,
    "free_hours": null
  }
}
"#;

/// Strategy for executing the Corpus command.
#[derive(Debug, Clone, Copy)]
pub struct CorpusStrategy;

impl CommandStrategy for CorpusStrategy {
    type Input = ();

    async fn execute(&self, (): ()) -> anyhow::Result<()> {
        let config = Config::load()?;
        let provider = build_provider(&config);
        let dir = config.data.dir.clone();
        fs::create_dir_all(&dir)?;

        info!("Embedding domain reference text");
        let domain = provider.embed(DOMAIN_REFERENCE_TEXT).await?;
        let dimension = domain.len();
        fs::write(dir.join(DOMAIN_FILE), serde_json::to_string_pretty(&domain)?)?;

        let total: usize = INTENT_SEEDS.iter().map(|(_, qs)| qs.len()).sum();
        info!("Embedding {total} intent exemplar questions");
        let mut intents: BTreeMap<String, Vec<serde_json::Value>> = BTreeMap::new();
        for (intent, questions) in INTENT_SEEDS {
            for question in *questions {
                let embedding = provider.embed(question).await?;
                anyhow::ensure!(
                    embedding.len() == dimension,
                    "embedding dimension drifted for \"{question}\""
                );
                intents
                    .entry((*intent).to_string())
                    .or_default()
                    .push(json!({ "question": question, "embedding": embedding }));
            }
        }
        fs::write(dir.join(INTENTS_FILE), serde_json::to_string_pretty(&intents)?)?;

        info!("Embedding {} field descriptors", FIELD_SEEDS.len());
        let mut fields: BTreeMap<String, serde_json::Value> = BTreeMap::new();
        for (key, description) in FIELD_SEEDS {
            let embedding = provider.embed(description).await?;
            anyhow::ensure!(
                embedding.len() == dimension,
                "embedding dimension drifted for \"{key}\""
            );
            fields.insert(
                (*key).to_string(),
                json!({ "description": description, "embedding": embedding }),
            );
        }
        fs::write(dir.join(FIELDS_FILE), serde_json::to_string_pretty(&fields)?)?;

        let facts_path = dir.join(FACTS_FILE);
        if facts_path.exists() {
            info!("Station facts already present, leaving untouched");
        } else {
            fs::write(&facts_path, STARTER_FACTS)?;
            println!("📄 Seeded starter station facts at {}", facts_path.display());
        }

        println!("✅ Corpus written to {} (dimension {dimension})", dir.display());
        Ok(())
    }
}
