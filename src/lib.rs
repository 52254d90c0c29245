pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::activity_log::ActivityLogger;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::medications::list_medications,
        api::handlers::medications::get_medication,
        api::handlers::medications::create_medication,
        api::handlers::medications::update_medication,
        api::handlers::medications::delete_medication,
        api::handlers::prescriptions::list_prescriptions,
        api::handlers::prescriptions::recent_prescriptions,
        api::handlers::prescriptions::get_prescription,
        api::handlers::prescriptions::create_prescription,
        api::handlers::prescriptions::update_prescription,
        api::handlers::prescriptions::refill_prescription,
        api::handlers::prescriptions::delete_prescription,
        api::handlers::reminders::list_reminders,
        api::handlers::reminders::today_reminders,
        api::handlers::reminders::get_reminder,
        api::handlers::reminders::create_reminder,
        api::handlers::reminders::complete_reminder,
        api::handlers::reminders::miss_reminder,
        api::handlers::reminders::snooze_reminder,
        api::handlers::reminders::delete_reminder,
        api::handlers::activities::list_activities,
        api::handlers::activities::recent_activities,
        api::handlers::activities::activities_by_type,
        api::handlers::activities::activities_by_medication,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::medications::MedicationResponse,
            api::handlers::medications::CreateMedicationRequest,
            api::handlers::medications::UpdateMedicationRequest,
            api::handlers::prescriptions::PrescriptionResponse,
            api::handlers::prescriptions::CreatePrescriptionRequest,
            api::handlers::prescriptions::UpdatePrescriptionRequest,
            api::handlers::prescriptions::RefillInfo,
            api::handlers::prescriptions::MedicationRef,
            api::handlers::reminders::ReminderResponse,
            api::handlers::reminders::CreateReminderRequest,
            api::handlers::reminders::SnoozeRequest,
            api::handlers::activities::ActivityResponse,
            api::handlers::activities::ActivityListResponse,
            api::handlers::health::HealthResponse,
            api::handlers::MessageResponse,
            entities::medications::TimeOfDay,
            entities::medications::TimeOfDayList,
            entities::prescriptions::PrescriptionStatus,
            entities::medication_reminders::ReminderStatus,
            entities::activities::ActivityType,
        )
    ),
    tags(
        (name = "medications", description = "Medication management endpoints"),
        (name = "prescriptions", description = "Prescription management endpoints"),
        (name = "reminders", description = "Medication reminder endpoints"),
        (name = "activities", description = "Activity history endpoints"),
        (name = "system", description = "System endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub activity_log: ActivityLogger,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        let activity_log = ActivityLogger::new(db.clone());
        Self {
            db,
            config,
            activity_log,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let medications = Router::new()
        .route(
            "/",
            get(api::handlers::medications::list_medications)
                .post(api::handlers::medications::create_medication),
        )
        .route(
            "/:id",
            get(api::handlers::medications::get_medication)
                .put(api::handlers::medications::update_medication)
                .delete(api::handlers::medications::delete_medication),
        );

    let prescriptions = Router::new()
        .route(
            "/",
            get(api::handlers::prescriptions::list_prescriptions)
                .post(api::handlers::prescriptions::create_prescription),
        )
        .route(
            "/recent",
            get(api::handlers::prescriptions::recent_prescriptions),
        )
        .route(
            "/:id",
            get(api::handlers::prescriptions::get_prescription)
                .put(api::handlers::prescriptions::update_prescription)
                .delete(api::handlers::prescriptions::delete_prescription),
        )
        .route(
            "/:id/refill",
            post(api::handlers::prescriptions::refill_prescription),
        );

    let reminders = Router::new()
        .route(
            "/",
            get(api::handlers::reminders::list_reminders)
                .post(api::handlers::reminders::create_reminder),
        )
        .route("/today", get(api::handlers::reminders::today_reminders))
        .route(
            "/:id",
            get(api::handlers::reminders::get_reminder)
                .delete(api::handlers::reminders::delete_reminder),
        )
        .route(
            "/:id/complete",
            put(api::handlers::reminders::complete_reminder),
        )
        .route("/:id/miss", put(api::handlers::reminders::miss_reminder))
        .route(
            "/:id/snooze",
            put(api::handlers::reminders::snooze_reminder),
        );

    let activities = Router::new()
        .route("/", get(api::handlers::activities::list_activities))
        .route("/recent", get(api::handlers::activities::recent_activities))
        .route(
            "/by-type/:type",
            get(api::handlers::activities::activities_by_type),
        )
        .route(
            "/by-medication/:medication_id",
            get(api::handlers::activities::activities_by_medication),
        );

    let authed = Router::new()
        .nest("/medications", medications)
        .nest("/prescriptions", prescriptions)
        .nest("/reminders", reminders)
        .nest("/activities", activities)
        .layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .nest("/api", authed)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
