use bson::{oid::ObjectId, DateTime as BsonDateTime};
use chrono::NaiveDate;
use rand::{rngs::StdRng, SeedableRng};
use std::collections::{HashMap, HashSet};

use ly_fantasy::database::{MemoryStore, Store};
use ly_fantasy::models::draft::{DraftPreference, TOTAL_ROUNDS};
use ly_fantasy::models::league::{League, LeagueStatus};
use ly_fantasy::models::legislator::Legislator;
use ly_fantasy::models::matchup::Matchup;
use ly_fantasy::models::score::{Score, ScoreCategory};
use ly_fantasy::models::team::Team;
use ly_fantasy::services::draft::DraftRunner;
use ly_fantasy::services::roster::update_bench;
use ly_fantasy::services::scheduler::MatchupScheduler;
use ly_fantasy::services::score_report::weekly_breakdown;
use ly_fantasy::services::week_calendar::local_midnight_utc;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// Monday.
fn season_start() -> NaiveDate {
    d(2024, 2, 19)
}

async fn league_with_teams(store: &MemoryStore, teams: usize, weeks: u32) -> (ObjectId, Vec<Team>) {
    let league = store
        .insert_league(League::new("立院夢幻聯盟", season_start(), weeks))
        .await;
    let league_id = league.id.unwrap();
    let mut created = Vec::new();
    for i in 0..teams {
        created.push(
            store
                .insert_team(Team::new(format!("Team {}", i + 1), format!("owner-{}", i), league_id))
                .await,
        );
    }
    (league_id, created)
}

async fn add_score(store: &MemoryStore, legislator_id: ObjectId, day: NaiveDate, points: f64, what: &str) {
    store
        .create_score(Score {
            id: None,
            legislator_id,
            date: BsonDateTime::from_chrono(local_midnight_utc(day)),
            category: ScoreCategory::FloorSpeech,
            points,
            description: what.to_string(),
            bill_number: None,
            bill_title: None,
            metadata: None,
            created_at: None,
        })
        .await
        .unwrap();
}

// ========== SCHEDULE ==========

#[tokio::test]
async fn five_teams_over_eight_weeks() {
    let store = MemoryStore::new();
    let (league_id, teams) = league_with_teams(&store, 5, 8).await;

    let matchups = MatchupScheduler::new(&store)
        .generate_schedule(&league_id)
        .await
        .unwrap();

    let mut by_week: HashMap<u32, Vec<&Matchup>> = HashMap::new();
    for m in &matchups {
        by_week.entry(m.week).or_default().push(m);
    }
    assert_eq!(by_week.len(), 8);
    for week in 1..=8 {
        let slots = &by_week[&week];
        // Two games plus one bye.
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.iter().filter(|m| m.is_bye()).count(), 1);
        let playing: HashSet<ObjectId> = slots
            .iter()
            .flat_map(|m| std::iter::once(m.team1_id).chain(m.team2_id))
            .collect();
        assert_eq!(playing.len(), 5);
    }

    // Within the first cycle every team sits out exactly once.
    let byes: Vec<ObjectId> = (1..=5)
        .flat_map(|w| by_week[&w].iter().filter(|m| m.is_bye()).map(|m| m.team1_id).collect::<Vec<_>>())
        .collect();
    let unique: HashSet<ObjectId> = byes.iter().copied().collect();
    assert_eq!(unique.len(), 5);
    assert!(teams.iter().all(|t| unique.contains(&t.id.unwrap())));

    // Week 6 repeats week 1.
    let pairs = |week: u32| -> HashSet<(ObjectId, Option<ObjectId>)> {
        by_week[&week].iter().map(|m| (m.team1_id, m.team2_id)).collect()
    };
    assert_eq!(pairs(6), pairs(1));

    // Regenerating replaces rather than appends.
    MatchupScheduler::new(&store).generate_schedule(&league_id).await.unwrap();
    assert_eq!(store.all_matchups().await.len(), 24);
}

#[tokio::test]
async fn schedule_needs_two_teams() {
    let store = MemoryStore::new();
    let (league_id, _) = league_with_teams(&store, 1, 4).await;
    assert!(MatchupScheduler::new(&store).generate_schedule(&league_id).await.is_err());
}

// ========== SCORING ==========

struct Fixture {
    store: MemoryStore,
    league_id: ObjectId,
    blue: Team,
    red: Team,
    starter: ObjectId,
    benched: ObjectId,
}

async fn scoring_fixture() -> Fixture {
    let store = MemoryStore::new();
    let league = store
        .insert_league(League::new("立院夢幻聯盟", season_start(), 2))
        .await;
    let league_id = league.id.unwrap();

    let starter = store.insert_legislator(Legislator::new("王小明", "甲黨")).await.id.unwrap();
    let benched = store.insert_legislator(Legislator::new("李大華", "乙黨")).await.id.unwrap();
    let rival = store.insert_legislator(Legislator::new("陳美玲", "丙黨")).await.id.unwrap();

    // Week 1 is 2024-02-19 .. 2024-02-25.
    add_score(&store, starter, d(2024, 2, 20), 3.0, "院會發言：第1次").await;
    add_score(&store, benched, d(2024, 2, 21), 9.0, "院會發言：第2次").await;
    add_score(&store, rival, d(2024, 2, 25), 5.0, "院會發言：第3次").await;
    // Week 2, must not leak into week 1.
    add_score(&store, rival, d(2024, 2, 26), 50.0, "院會發言：第4次").await;

    let mut blue = Team::new("Blue", "owner-1", league_id);
    blue.legislator_ids = vec![starter, benched];
    blue.bench.insert(benched);
    let blue = store.insert_team(blue).await;

    let mut red = Team::new("Red", "owner-2", league_id);
    red.legislator_ids = vec![rival];
    let red = store.insert_team(red).await;

    Fixture {
        store,
        league_id,
        blue,
        red,
        starter,
        benched,
    }
}

#[tokio::test]
async fn weekly_score_skips_the_bench() {
    let f = scoring_fixture().await;
    let scheduler = MatchupScheduler::new(&f.store);
    let matchups = scheduler.generate_schedule(&f.league_id).await.unwrap();
    let week1 = matchups.iter().find(|m| m.week == 1).unwrap();

    let scored = scheduler.calculate_matchup(&week1.id.unwrap(), false).await.unwrap();
    let (blue_score, red_score) = if scored.team1_id == f.blue.id.unwrap() {
        (scored.team1_score.unwrap(), scored.team2_score.unwrap())
    } else {
        (scored.team2_score.unwrap(), scored.team1_score.unwrap())
    };
    assert_eq!(blue_score, 3.0);
    assert_eq!(red_score, 5.0);
    assert_eq!(scored.winner_id, f.red.id);

    // A later bench move leaves the finished week alone.
    update_bench(&f.store, &f.blue.id.unwrap(), Vec::new()).await.unwrap();
    let again = scheduler.calculate_matchup(&week1.id.unwrap(), false).await.unwrap();
    assert_eq!(again.winner_id, f.red.id);
    assert_eq!(again.team1_score, scored.team1_score);

    scheduler.calculate_week(&f.league_id, 1, false).await.unwrap();
    let stored = f.store.get_matchup(&week1.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(stored.winner_id, f.red.id);
    let blue = f.store.get_team(&f.blue.id.unwrap()).await.unwrap().unwrap();
    assert_eq!((blue.wins, blue.losses), (0, 1));

    // An explicit recompute uses the current bench.
    let rescored = scheduler.calculate_matchup(&week1.id.unwrap(), true).await.unwrap();
    assert_eq!(rescored.winner_id, f.blue.id);
}

#[tokio::test]
async fn bench_must_come_from_the_roster() {
    let f = scoring_fixture().await;
    let outsider = ObjectId::new();
    let result = update_bench(&f.store, &f.blue.id.unwrap(), vec![f.starter, outsider]).await;
    assert!(result.is_err());

    let team = update_bench(&f.store, &f.blue.id.unwrap(), vec![f.starter]).await.unwrap();
    assert!(team.bench.contains(&f.starter));
    assert!(!team.bench.contains(&f.benched));
}

#[tokio::test]
async fn week_calculation_updates_records_and_standings() {
    let f = scoring_fixture().await;
    let scheduler = MatchupScheduler::new(&f.store);
    scheduler.generate_schedule(&f.league_id).await.unwrap();

    let scored = scheduler.calculate_week(&f.league_id, 1, false).await.unwrap();
    assert_eq!(scored.len(), 1);

    let red = f.store.get_team(&f.red.id.unwrap()).await.unwrap().unwrap();
    let blue = f.store.get_team(&f.blue.id.unwrap()).await.unwrap().unwrap();
    assert_eq!((red.wins, red.losses, red.ties), (1, 0, 0));
    assert_eq!((blue.wins, blue.losses, blue.ties), (0, 1, 0));

    // Recomputing is idempotent.
    scheduler.calculate_week(&f.league_id, 1, false).await.unwrap();
    let red = f.store.get_team(&f.red.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(red.wins, 1);

    let standings = scheduler.standings(&f.league_id).await.unwrap();
    assert_eq!(standings[0].team_id, f.red.id.unwrap());
    assert_eq!(standings[0].points_for, 5.0);
    assert_eq!(standings[1].points_for, 3.0);

    assert!(scheduler.calculate_week(&f.league_id, 9, false).await.is_err());
}

#[tokio::test]
async fn weekly_breakdown_groups_one_week() {
    let f = scoring_fixture().await;
    let breakdown = weekly_breakdown(&f.store, &f.benched, season_start(), 1).await.unwrap();
    assert_eq!(breakdown.legislator_name, "李大華");
    assert_eq!(breakdown.week_start, d(2024, 2, 19));
    assert_eq!(breakdown.week_end, d(2024, 2, 25));
    assert_eq!(breakdown.total, 9.0);
    assert_eq!(breakdown.categories.len(), 1);
    assert_eq!(breakdown.categories[0].count, 1);

    let empty = weekly_breakdown(&f.store, &f.benched, season_start(), 2).await.unwrap();
    assert_eq!(empty.total, 0.0);
    assert!(weekly_breakdown(&f.store, &f.benched, season_start(), 0).await.is_err());
}

// ========== DRAFT ==========

#[tokio::test]
async fn draft_fills_rosters_and_schedules_the_season() {
    let store = MemoryStore::new();
    let (league_id, teams) = league_with_teams(&store, 2, 4).await;

    let mut pool = Vec::new();
    for i in 0..20 {
        pool.push(
            store
                .insert_legislator(Legislator::new(format!("委員{:02}", i), "甲黨"))
                .await
                .id
                .unwrap(),
        );
    }
    let mut retired = Legislator::new("離職委員", "乙黨");
    retired.is_leave = true;
    let retired = store.insert_legislator(retired).await.id.unwrap();

    let first_team = teams[0].id.unwrap();
    store
        .insert_preference(DraftPreference {
            team_id: first_team,
            legislator_id: pool[7],
            rank: 1,
        })
        .await;
    store
        .insert_preference(DraftPreference {
            team_id: first_team,
            legislator_id: retired,
            rank: 2,
        })
        .await;

    let mut rng = StdRng::seed_from_u64(2024);
    let outcome = DraftRunner::new(&store).run(&league_id, &mut rng).await.unwrap();

    assert_eq!(outcome.picks.len(), 2 * TOTAL_ROUNDS as usize);
    assert_eq!(outcome.picks[0].legislator_id, pool[7]);
    assert!(!outcome.picks[0].auto_picked);
    assert!(outcome.picks.iter().all(|p| p.legislator_id != retired));
    assert_eq!(outcome.matchups_created, 4);
    assert!(outcome.schedule_error.is_none());

    let league = store.get_league(&league_id).await.unwrap().unwrap();
    assert_eq!(league.status, LeagueStatus::Active);

    for team in store.list_teams(&league_id).await.unwrap() {
        assert_eq!(team.legislator_ids.len(), TOTAL_ROUNDS as usize);
        assert_eq!(team.bench.len(), 3);
        assert_eq!(team.active_legislator_ids().len(), 6);
    }
    assert_eq!(store.list_draft_picks(&league_id).await.unwrap().len(), 18);

    let again = DraftRunner::new(&store)
        .run(&league_id, &mut StdRng::seed_from_u64(1))
        .await;
    assert!(again.is_err());
}

#[tokio::test]
async fn draft_rejects_a_small_pool() {
    let store = MemoryStore::new();
    let (league_id, _) = league_with_teams(&store, 2, 4).await;
    for i in 0..10 {
        store
            .insert_legislator(Legislator::new(format!("委員{:02}", i), "甲黨"))
            .await;
    }

    let result = DraftRunner::new(&store)
        .run(&league_id, &mut StdRng::seed_from_u64(9))
        .await;
    assert!(result.is_err());

    let league = store.get_league(&league_id).await.unwrap().unwrap();
    assert_eq!(league.status, LeagueStatus::Pending);
}
