use axum::Router;

pub async fn create_test_app() -> Router {
    // An unparseable DATABASE_URL leaves the app without a store, which is
    // what these router-level tests exercise.
    std::env::set_var("DATABASE_URL", "");

    classroom_backend_rust::create_app().await
}
