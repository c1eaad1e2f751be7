use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use chrono::Duration;
use std::sync::Arc;
use validator::Validate;

use crate::core::{
    LedgerError, LikeLedger, MatchRegistry, PairError, ProfileError, ProfileService,
    RegistryError, ScoreCalculator, SwipeError, SwipeOrchestrator,
};
use crate::models::{
    CandidatesResponse, ErrorResponse, HealthResponse, MatchesResponse, ProfileResponse,
    QuestionsResponse, QuizResultResponse, ScoreQuizRequest, SubmitQuizRequest, SwipeLeftResponse,
    SwipeRequest, UpsertProfileRequest, UserQuery,
};
use crate::services::{CacheManager, Store, StoreError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub cache: Option<Arc<CacheManager>>,
    pub profiles: ProfileService,
    pub swipes: SwipeOrchestrator,
}

impl AppState {
    /// Wire every component to the same backend
    pub fn new<S: Store + 'static>(
        store: Arc<S>,
        calculator: ScoreCalculator,
        cache: Option<Arc<CacheManager>>,
        freshness_window: Duration,
        candidate_min_readiness: u8,
        candidate_limit: usize,
    ) -> Self {
        let ledger = LikeLedger::new(store.clone());
        let registry = MatchRegistry::new(store.clone());
        let swipes = SwipeOrchestrator::new(ledger, registry).with_freshness_window(freshness_window);
        let profiles = ProfileService::new(Arc::new(calculator), store.clone())
            .with_candidate_rules(candidate_min_readiness, candidate_limit);

        Self {
            store,
            cache,
            profiles,
            swipes,
        }
    }
}

/// Configure all routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/profiles", web::put().to(upsert_profile))
        .route("/profiles", web::get().to(get_profile))
        .route("/quiz/questions", web::get().to(list_questions))
        .route("/quiz/score", web::post().to(score_quiz))
        .route("/quiz/submit", web::post().to(submit_quiz))
        .route("/swipes/right", web::post().to(swipe_right))
        .route("/swipes/left", web::post().to(swipe_left))
        .route("/matches", web::get().to(get_matches))
        .route("/candidates", web::get().to(get_candidates));
}

fn error_response(status: StatusCode, error: &str, message: String) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message,
        status_code: status.as_u16(),
    })
}

fn validation_response(errors: validator::ValidationErrors) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string())
}

fn store_status(err: &StoreError) -> StatusCode {
    match err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn swipe_error_response(err: &SwipeError) -> HttpResponse {
    let status = match err {
        SwipeError::InvalidPair(_) | SwipeError::Registry(RegistryError::Pair(_)) => {
            StatusCode::BAD_REQUEST
        }
        SwipeError::Ledger(LedgerError::Store(e)) | SwipeError::Registry(RegistryError::Store(e)) => {
            store_status(e)
        }
        SwipeError::Registry(RegistryError::ConflictWithoutRow(..)) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, "Swipe failed", err.to_string())
}

fn profile_error_response(err: &ProfileError) -> HttpResponse {
    let (status, error) = match err {
        ProfileError::Scoring(_) => (StatusCode::BAD_REQUEST, "Invalid quiz answers"),
        ProfileError::QuizIncomplete(_) => (StatusCode::CONFLICT, "Quiz not completed"),
        ProfileError::Store(e) => (store_status(e), "Profile store failure"),
    };
    error_response(status, error, err.to_string())
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let healthy = state.store.health_check().await.unwrap_or(false);

    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Create or edit a profile
///
/// PUT /api/v1/profiles
///
/// Request body:
/// ```json
/// { "userId": "string", "fullName": "string", "age": 30, "city": "string", "intent": "string", "bio": "string" }
/// ```
async fn upsert_profile(
    state: web::Data<AppState>,
    req: web::Json<UpsertProfileRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_response(errors);
    }

    let details = req.into_inner().into_details();
    match state.profiles.save_profile(&details).await {
        Ok(profile) => HttpResponse::Ok().json(ProfileResponse { profile }),
        Err(e) => {
            tracing::error!("Failed to save profile {}: {}", details.id, e);
            profile_error_response(&e)
        }
    }
}

/// Fetch a profile
///
/// GET /api/v1/profiles?userId={userId}
async fn get_profile(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_response(errors);
    }

    match state.profiles.profile(&query.user_id).await {
        Ok(profile) => HttpResponse::Ok().json(ProfileResponse { profile }),
        Err(e) => profile_error_response(&e),
    }
}

/// Question bank endpoint
///
/// GET /api/v1/quiz/questions
async fn list_questions(state: web::Data<AppState>) -> impl Responder {
    let questions = state.profiles.calculator().bank().questions().to_vec();
    HttpResponse::Ok().json(QuestionsResponse {
        count: questions.len(),
        questions,
    })
}

/// Score answers without saving them
///
/// POST /api/v1/quiz/score
///
/// Request body:
/// ```json
/// { "answers": { "1": 5, "2": 4 } }
/// ```
async fn score_quiz(
    state: web::Data<AppState>,
    req: web::Json<ScoreQuizRequest>,
) -> impl Responder {
    match state.profiles.compute_scores(&req.answers) {
        Ok(scores) => HttpResponse::Ok().json(scores),
        Err(e) => profile_error_response(&e),
    }
}

/// Score answers and write them onto the user's profile
///
/// POST /api/v1/quiz/submit
///
/// Request body:
/// ```json
/// { "userId": "string", "answers": { "1": 5, "2": 4 } }
/// ```
async fn submit_quiz(
    state: web::Data<AppState>,
    req: web::Json<SubmitQuizRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_response(errors);
    }

    tracing::info!("Quiz submitted by {} ({} answers)", req.user_id, req.answers.len());

    match state.profiles.submit_quiz(&req.user_id, &req.answers).await {
        Ok(result) => HttpResponse::Ok().json(QuizResultResponse {
            user_id: req.user_id.clone(),
            scores: result.scores,
            insights: result.insights,
        }),
        Err(e) => {
            tracing::error!("Failed to submit quiz for {}: {}", req.user_id, e);
            profile_error_response(&e)
        }
    }
}

/// Positive swipe endpoint
///
/// POST /api/v1/swipes/right
///
/// Request body:
/// ```json
/// { "actorId": "string", "targetId": "string" }
/// ```
///
/// Response: `{ "matched": bool, "isNew": bool, "match": {...}? }`
async fn swipe_right(
    state: web::Data<AppState>,
    req: web::Json<SwipeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_response(errors);
    }

    let outcome = match state.swipes.swipe_right(&req.actor_id, &req.target_id).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Swipe {} -> {} failed: {}", req.actor_id, req.target_id, e);
            return swipe_error_response(&e);
        }
    };

    if outcome.matched {
        if let Some(cache) = &state.cache {
            if let Err(e) = cache.invalidate_matches(&req.actor_id, &req.target_id).await {
                tracing::warn!("Failed to invalidate match cache: {}", e);
            }
        }
    }

    HttpResponse::Ok().json(outcome)
}

/// Negative swipe endpoint; records nothing
///
/// POST /api/v1/swipes/left
async fn swipe_left(
    state: web::Data<AppState>,
    req: web::Json<SwipeRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_response(errors);
    }

    state.swipes.swipe_left(&req.actor_id, &req.target_id);
    HttpResponse::Ok().json(SwipeLeftResponse { advanced: true })
}

/// List a user's matches
///
/// GET /api/v1/matches?userId={userId}
async fn get_matches(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_response(errors);
    }
    let user_id = &query.user_id;

    // Read the generation before the store so a match resolved in between
    // invalidates whatever this request ends up caching
    let mut generation = None;
    if let Some(cache) = &state.cache {
        match cache.get_matches(user_id).await {
            Ok(Some(matches)) => {
                return HttpResponse::Ok().json(MatchesResponse {
                    user_id: user_id.clone(),
                    count: matches.len(),
                    matches,
                });
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Match cache read failed for {}: {}", user_id, e),
        }

        generation = match cache.matches_generation(user_id).await {
            Ok(generation) => Some(generation),
            Err(e) => {
                tracing::warn!("Match cache generation unavailable for {}: {}", user_id, e);
                None
            }
        };
    }

    match state.swipes.registry().matches_for(user_id).await {
        Ok(matches) => {
            if let (Some(cache), Some(generation)) = (&state.cache, generation) {
                if let Err(e) = cache.fill_matches(user_id, generation, &matches).await {
                    tracing::warn!("Failed to cache matches for {}: {}", user_id, e);
                }
            }

            HttpResponse::Ok().json(MatchesResponse {
                user_id: user_id.clone(),
                count: matches.len(),
                matches,
            })
        }
        Err(e) => {
            tracing::error!("Failed to list matches for {}: {}", user_id, e);
            let status = match &e {
                RegistryError::Store(store) => store_status(store),
                RegistryError::Pair(PairError::NotAMember { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::SERVICE_UNAVAILABLE,
            };
            error_response(status, "Failed to list matches", e.to_string())
        }
    }
}

/// List profiles the user may browse
///
/// GET /api/v1/candidates?userId={userId}
async fn get_candidates(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_response(errors);
    }

    match state.profiles.candidates_for(&query.user_id).await {
        Ok(candidates) => HttpResponse::Ok().json(CandidatesResponse {
            user_id: query.user_id.clone(),
            count: candidates.len(),
            candidates,
        }),
        Err(e) => {
            tracing::warn!("Failed to list candidates for {}: {}", query.user_id, e);
            profile_error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, SwipeOutcome};
    use crate::services::MemoryStore;
    use actix_web::{test, App};

    async fn state_with(store: Arc<MemoryStore>) -> AppState {
        AppState::new(
            store,
            ScoreCalculator::standard(),
            None,
            Duration::seconds(5),
            4,
            20,
        )
    }

    #[actix_web::test]
    async fn test_mutual_swipe_over_http() {
        let store = Arc::new(MemoryStore::new());
        let state = state_with(store.clone()).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await;

        let first = test::TestRequest::post()
            .uri("/api/v1/swipes/right")
            .set_json(serde_json::json!({"actorId": "alice", "targetId": "bob"}))
            .to_request();
        let outcome: SwipeOutcome = test::call_and_read_body_json(&app, first).await;
        assert!(!outcome.matched);

        let second = test::TestRequest::post()
            .uri("/api/v1/swipes/right")
            .set_json(serde_json::json!({"actorId": "bob", "targetId": "alice"}))
            .to_request();
        let outcome: SwipeOutcome = test::call_and_read_body_json(&app, second).await;
        assert!(outcome.matched);
        assert!(outcome.is_new);
        assert_eq!(store.match_count().await, 1);

        let list = test::TestRequest::get()
            .uri("/api/v1/matches?userId=alice")
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, list).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["matches"][0]["otherUserId"], "bob");
    }

    #[actix_web::test]
    async fn test_cached_match_list_sees_new_match() {
        let store = Arc::new(MemoryStore::new());
        let mut state = state_with(store.clone()).await;
        state.cache = Some(Arc::new(CacheManager::in_process(100, 300)));
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await;

        // Prime the cache with an empty list
        let list = test::TestRequest::get().uri("/api/v1/matches?userId=alice").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, list).await;
        assert_eq!(body["count"], 0);

        for (actor, target) in [("alice", "bob"), ("bob", "alice")] {
            let req = test::TestRequest::post()
                .uri("/api/v1/swipes/right")
                .set_json(serde_json::json!({"actorId": actor, "targetId": target}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success());
        }

        let list = test::TestRequest::get().uri("/api/v1/matches?userId=alice").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, list).await;
        assert_eq!(body["count"], 1);
    }

    #[actix_web::test]
    async fn test_register_submit_and_browse() {
        let state = state_with(Arc::new(MemoryStore::new())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await;

        let answers: serde_json::Map<String, serde_json::Value> =
            (1..=40).map(|id| (id.to_string(), serde_json::json!(4))).collect();

        for (user, intent) in [("alice", "Long-term"), ("bob", "Something casual")] {
            let req = test::TestRequest::put()
                .uri("/api/v1/profiles")
                .set_json(serde_json::json!({"userId": user, "age": 30, "intent": intent}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);

            let req = test::TestRequest::post()
                .uri("/api/v1/quiz/submit")
                .set_json(serde_json::json!({"userId": user, "answers": answers}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get().uri("/api/v1/candidates?userId=alice").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["candidates"][0]["id"], "bob");
        assert_eq!(body["candidates"][0]["intent"], "Something casual");
    }

    #[actix_web::test]
    async fn test_underage_profile_is_rejected() {
        let state = state_with(Arc::new(MemoryStore::new())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await;

        let req = test::TestRequest::put()
            .uri("/api/v1/profiles")
            .set_json(serde_json::json!({"userId": "kid", "age": 16}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_self_swipe_is_bad_request() {
        let state = state_with(Arc::new(MemoryStore::new())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/swipes/right")
            .set_json(serde_json::json!({"actorId": "alice", "targetId": "alice"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_candidates_before_quiz_is_conflict() {
        let store = Arc::new(MemoryStore::new());
        store.seed_profile(Profile::new("alice")).await;
        let state = state_with(store).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/candidates?userId=alice")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_score_rejects_unknown_question() {
        let state = state_with(Arc::new(MemoryStore::new())).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/quiz/score")
            .set_json(serde_json::json!({"answers": {"41": 3}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
