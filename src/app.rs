// app.rs - Shared state and the HTTP router
//
// Route tiers follow the handler layout: public routes take no credentials,
// protected routes run `protect` first, and each method on a protected route
// carries its own role gate inside that.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::auth::{PasswordHasher, TokenError, TokenService};
use crate::config::AppConfig;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{gated, protect, render_error_detail, restrict_to, RoleGate};
use crate::services::{AuditLogWriter, UserService, WeatherService};
use crate::store::Stores;
use crate::types::Role;

const READERS: &[Role] = &[Role::Teacher, Role::Student];
const WRITERS: &[Role] = &[Role::Teacher, Role::Sensor];
const TEACHERS: &[Role] = &[Role::Teacher];

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: Arc<TokenService>,
    pub stores: Stores,
    pub users: Arc<UserService>,
    pub weather: Arc<WeatherService>,
}

impl AppState {
    pub fn new(config: AppConfig, stores: Stores) -> Result<Self, TokenError> {
        let tokens = TokenService::new(&config.security.jwt_secret, config.security.jwt_expires_in)?;
        let audit = AuditLogWriter::new(stores.logs.clone());
        let weather = WeatherService::new(stores.weather.clone(), audit, config.filter.clone());
        let users = UserService::new(stores.users.clone(), Arc::new(PasswordHasher::new()), config.filter.clone());

        Ok(Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            stores,
            users: Arc::new(users),
            weather: Arc::new(weather),
        })
    }
}

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let api = Router::new()
        .nest("/weather", weather_routes(state.clone()))
        .nest("/users", user_routes(state.clone()));

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .nest("/api/v1", api)
        .fallback(public::not_found)
        .layer(middleware::map_response_with_state(config.environment, render_error_detail))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors(&config))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("SAMEORIGIN"),
                ))
                .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes)),
        )
        .with_state(state)
}

fn weather_routes(state: AppState) -> Router<AppState> {
    use protected::weather;

    Router::new()
        .route(
            "/",
            gated(get(weather::list), READERS).merge(gated(post(weather::create), WRITERS)),
        )
        .route("/batch", gated(post(weather::create_batch), WRITERS))
        .route("/max-precipitation/:sensor_name", gated(get(weather::max_precipitation), READERS))
        .route("/max-temp", gated(get(weather::max_temperature), READERS))
        .route("/weather-stats/:sensor_name", gated(get(weather::stats), READERS))
        .route("/update-precipitation/:id", gated(patch(weather::update_precipitation), TEACHERS))
        .route(
            "/:id",
            gated(get(weather::get), READERS)
                .merge(gated(patch(weather::replace).delete(weather::delete), TEACHERS)),
        )
        .route_layer(middleware::from_fn_with_state(state, protect))
}

fn user_routes(state: AppState) -> Router<AppState> {
    let open = Router::new()
        .route("/signup", post(public::signup))
        .route("/login", post(public::login))
        .route("/logout", get(public::logout));

    let account = Router::new()
        .route("/updateMe", patch(protected::update_me))
        .route("/updateMyPassword", patch(protected::update_my_password));

    let admin = Router::new()
        .route("/", get(elevated::list_users))
        .route("/create-user", post(elevated::create_user))
        .route("/last-login", delete(elevated::delete_by_last_login))
        .route("/update-role", patch(elevated::update_roles))
        .route(
            "/:id",
            get(elevated::get_user).patch(elevated::update_user).delete(elevated::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(RoleGate::new(TEACHERS.iter().copied()), restrict_to));

    open.merge(account.merge(admin).route_layer(middleware::from_fn_with_state(state, protect)))
}

fn cors(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
