//! Login, registration and logout flows. These are user-facing: every failure
//! comes back as a [`SurveyError`] the caller shows as an alert.

use std::sync::Arc;

use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::time;

use crate::{
    airports::{nearest_airport, Airport},
    api::{ApiError, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
    device::device_id,
    error::SurveyError,
    geofence::{GeofenceController, LocationProvider, PermissionStatus, LOCATION_TIMEOUT},
    models::{user::USER_ROLE, Coordinates},
    navigation::Route,
    session::SessionStore,
    settings::SettingsStore,
};

pub const PHONE_DIGITS: usize = 10;

/// The backend's auth endpoints.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub phone: String,
    pub company: String,
    /// Set once `verify_phone` accepted the number.
    pub phone_verified: bool,
}

/// Where the device was when the registration screen opened.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationLocation {
    pub coordinates: Coordinates,
    pub airport: &'static Airport,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub route: Route,
    /// Whether a geofence anchor was captured for this session.
    pub anchored: bool,
}

/// Client-side phone "verification": a length check and nothing more.
pub fn verify_phone(phone: &str) -> Result<(), SurveyError> {
    if phone.chars().count() != PHONE_DIGITS {
        return Err(SurveyError::Validation(format!(
            "Please enter a valid {PHONE_DIGITS}-digit phone number"
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    settings: Arc<SettingsStore>,
    session: SessionStore,
    location: Arc<dyn LocationProvider>,
    geofence: GeofenceController,
}

impl AuthService {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        settings: Arc<SettingsStore>,
        session: SessionStore,
        location: Arc<dyn LocationProvider>,
        geofence: GeofenceController,
    ) -> Self {
        Self {
            backend,
            settings,
            session,
            location,
            geofence,
        }
    }

    /// Captures the device position and the nearest known airport. Registration
    /// cannot proceed without it.
    pub async fn locate_for_registration(&self) -> Result<RegistrationLocation, SurveyError> {
        match self.permission().await {
            Some(PermissionStatus::Granted) => {}
            _ => {
                return Err(SurveyError::Permission(
                    "Location access is required".into(),
                ))
            }
        }

        let coordinates = match time::timeout(LOCATION_TIMEOUT, self.location.current_position())
            .await
        {
            Ok(Ok(position)) => position,
            Ok(Err(err)) => {
                warn!("Location lookup failed during registration: {err:#}");
                return Err(SurveyError::Permission("Location not captured".into()));
            }
            Err(_) => return Err(SurveyError::Permission("Location not captured".into())),
        };

        Ok(RegistrationLocation {
            coordinates,
            airport: nearest_airport(coordinates),
        })
    }

    pub async fn register(
        &self,
        form: &RegistrationForm,
        location: Option<RegistrationLocation>,
    ) -> Result<Route, SurveyError> {
        let airport = location.map(|l| l.airport);
        if form.email.is_empty()
            || form.password.is_empty()
            || form.phone.is_empty()
            || airport.is_none()
        {
            return Err(SurveyError::Validation(
                "All required fields must be filled".into(),
            ));
        }
        if !form.phone_verified {
            return Err(SurveyError::Validation(
                "Please verify your phone number".into(),
            ));
        }
        let (Some(location), Some(airport)) = (location, airport) else {
            return Err(SurveyError::Validation("Location not captured".into()));
        };

        let request = RegisterRequest {
            email: form.email.clone(),
            password: form.password.clone(),
            phone: form.phone.clone(),
            role: USER_ROLE.into(),
            airport_code: airport.code.into(),
            company: form.company.clone(),
            latitude: location.coordinates.latitude,
            longitude: location.coordinates.longitude,
        };

        let response = self.backend.register(&request).await?;
        if !response.is_success() {
            return Err(SurveyError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Registration failed".into()),
            ));
        }

        self.session.set_airport(airport.code, airport.name)?;
        info!("Registered {} at {}", form.email, airport.code);
        Ok(Route::Login)
    }

    /// Authenticates, starts a new session and picks the dashboard by role. The
    /// geofence anchor is captured only if location permission is granted now.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, SurveyError> {
        if email.is_empty() || password.is_empty() {
            return Err(SurveyError::Validation(
                "Email and password are required".into(),
            ));
        }

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            device_id: device_id(&self.settings)?,
        };

        let response = self.backend.login(&request).await?;
        let message = response.message.clone();
        let Some(auth) = response.into_session() else {
            return Err(SurveyError::Rejected(
                message.unwrap_or_else(|| "Login failed".into()),
            ));
        };

        let anchor = self.capture_anchor().await;
        let route = if auth.user.is_admin() {
            Route::AdminDashboard
        } else {
            Route::UserDashboard
        };

        self.geofence.reset().await;
        self.session.begin(auth, anchor)?;

        Ok(LoginOutcome {
            route,
            anchored: anchor.is_some(),
        })
    }

    /// Voluntary logout: monitoring stops silently and the session is dropped.
    pub async fn logout(&self) -> Result<Route, SurveyError> {
        self.geofence.exit_dashboard().await;
        self.session.clear()?;
        info!("Logged out");
        Ok(Route::Login)
    }

    async fn capture_anchor(&self) -> Option<Coordinates> {
        if self.permission().await != Some(PermissionStatus::Granted) {
            info!("Location permission not granted at login; geofence disabled");
            return None;
        }
        match time::timeout(LOCATION_TIMEOUT, self.location.current_position()).await {
            Ok(Ok(position)) => Some(position),
            Ok(Err(err)) => {
                warn!("Could not read login location: {err:#}");
                None
            }
            Err(_) => {
                warn!("Login location read timed out");
                None
            }
        }
    }

    async fn permission(&self) -> Option<PermissionStatus> {
        match time::timeout(LOCATION_TIMEOUT, self.location.request_permission()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(err)) => {
                warn!("Location permission request failed: {err:#}");
                None
            }
            Err(_) => {
                warn!("Location permission request timed out");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::AuthBackend;
    use crate::api::{ApiError, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};

    #[derive(Default)]
    pub struct FakeBackend {
        pub login_response: Mutex<Option<LoginResponse>>,
        pub register_response: Mutex<Option<RegisterResponse>>,
        pub logins: Mutex<Vec<LoginRequest>>,
        pub registrations: Mutex<Vec<RegisterRequest>>,
    }

    impl FakeBackend {
        pub fn logging_in_as(role: &str) -> Self {
            let response: LoginResponse = serde_json::from_value(serde_json::json!({
                "token": "jwt",
                "user": { "role": role, "email": "user@example.com" },
                "message": "Login successful"
            }))
            .unwrap();
            Self {
                login_response: Mutex::new(Some(response)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl AuthBackend for FakeBackend {
        async fn register(&self, request: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
            self.registrations.lock().unwrap().push(request.clone());
            self.register_response
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ApiError::Connection("http://backend".into()))
        }

        async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
            self.logins.lock().unwrap().push(request.clone());
            self.login_response
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ApiError::Connection("http://backend".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeBackend;
    use super::*;
    use crate::{
        events::EventBus,
        geofence::{testing::FakeLocation, GeofencePolicy, GeofenceStatus},
    };

    const DEL: Coordinates = Coordinates {
        latitude: 28.5562,
        longitude: 77.1000,
    };

    struct Fixture {
        _dir: tempfile::TempDir,
        backend: Arc<FakeBackend>,
        location: Arc<FakeLocation>,
        session: SessionStore,
        geofence: GeofenceController,
        auth: AuthService,
    }

    fn fixture(backend: FakeBackend) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let settings = Arc::new(SettingsStore::open(dir.path().join("settings.json")).unwrap());
        let session = SessionStore::new(settings.clone());
        let backend = Arc::new(backend);
        let location = Arc::new(FakeLocation::at(DEL));
        let geofence = GeofenceController::new(
            session.clone(),
            location.clone(),
            GeofencePolicy::default(),
            EventBus::new(),
        );
        let auth = AuthService::new(
            backend.clone(),
            settings,
            session.clone(),
            location.clone(),
            geofence.clone(),
        );
        Fixture {
            _dir: dir,
            backend,
            location,
            session,
            geofence,
            auth,
        }
    }

    fn form() -> RegistrationForm {
        RegistrationForm {
            email: "user@example.com".into(),
            password: "secret".into(),
            phone: "9876543210".into(),
            company: "AAI".into(),
            phone_verified: true,
        }
    }

    #[test]
    fn phone_check_is_length_only() {
        assert!(verify_phone("9876543210").is_ok());
        assert!(verify_phone("98765").is_err());
        assert!(verify_phone("98765432101").is_err());
    }

    #[tokio::test]
    async fn login_routes_by_role_and_anchors() {
        let f = fixture(FakeBackend::logging_in_as("ADMIN"));
        let outcome = f.auth.login("admin@example.com", "pw").await.unwrap();

        assert_eq!(outcome.route, Route::AdminDashboard);
        assert!(outcome.anchored);
        assert_eq!(f.session.anchor(), Some(DEL));
        assert_eq!(f.session.auth().unwrap().token, "jwt");

        let logins = f.backend.logins.lock().unwrap();
        assert_eq!(logins[0].device_id.len(), 64);
    }

    #[tokio::test]
    async fn login_without_permission_has_no_anchor() {
        let f = fixture(FakeBackend::logging_in_as("USER"));
        f.location.set_permission(Ok(PermissionStatus::Denied));

        let outcome = f.auth.login("user@example.com", "pw").await.unwrap();
        assert_eq!(outcome.route, Route::UserDashboard);
        assert!(!outcome.anchored);
        assert!(f.session.is_authenticated());
        assert_eq!(f.session.anchor(), None);
        assert_eq!(f.geofence.enter_dashboard().await, GeofenceStatus::Inactive);
    }

    #[tokio::test]
    async fn rejected_login_surfaces_backend_message() {
        let backend = FakeBackend::default();
        *backend.login_response.lock().unwrap() = Some(LoginResponse {
            message: Some("Invalid credentials".into()),
            ..Default::default()
        });
        let f = fixture(backend);

        let err = f.auth.login("user@example.com", "bad").await.unwrap_err();
        assert_eq!(err.alert().message, "Invalid credentials");
        assert!(!f.session.is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_network_error() {
        let f = fixture(FakeBackend::default());
        let err = f.auth.login("user@example.com", "pw").await.unwrap_err();
        assert!(matches!(err, SurveyError::Network(_)));
    }

    #[tokio::test]
    async fn registration_validates_before_any_request() {
        let f = fixture(FakeBackend::default());
        let location = f.auth.locate_for_registration().await.unwrap();

        let mut missing = form();
        missing.email.clear();
        let err = f.auth.register(&missing, Some(location)).await.unwrap_err();
        assert_eq!(err.alert().message, "All required fields must be filled");

        let mut unverified = form();
        unverified.phone_verified = false;
        let err = f.auth.register(&unverified, Some(location)).await.unwrap_err();
        assert_eq!(err.alert().message, "Please verify your phone number");

        let err = f.auth.register(&form(), None).await.unwrap_err();
        assert!(matches!(err, SurveyError::Validation(_)));

        assert!(f.backend.registrations.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn successful_registration_remembers_airport() {
        let backend = FakeBackend::default();
        *backend.register_response.lock().unwrap() = Some(RegisterResponse {
            message: Some("User registered successfully".into()),
            ..Default::default()
        });
        let f = fixture(backend);

        let location = f.auth.locate_for_registration().await.unwrap();
        assert_eq!(location.airport.code, "DEL");

        let route = f.auth.register(&form(), Some(location)).await.unwrap();
        assert_eq!(route, Route::Login);
        assert_eq!(
            f.session.airport(),
            (
                Some("DEL".to_string()),
                Some("Indira Gandhi International Airport".to_string())
            )
        );

        let sent = f.backend.registrations.lock().unwrap();
        assert_eq!(sent[0].role, "USER");
        assert_eq!(sent[0].airport_code, "DEL");
    }

    #[tokio::test]
    async fn registration_requires_location_permission() {
        let f = fixture(FakeBackend::default());
        f.location.set_permission(Ok(PermissionStatus::Denied));
        assert!(matches!(
            f.auth.locate_for_registration().await,
            Err(SurveyError::Permission(_))
        ));
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let f = fixture(FakeBackend::logging_in_as("USER"));
        f.auth.login("user@example.com", "pw").await.unwrap();
        assert_eq!(f.geofence.enter_dashboard().await, GeofenceStatus::Monitoring);

        assert_eq!(f.auth.logout().await.unwrap(), Route::Login);
        assert!(!f.session.is_authenticated());
        assert_eq!(f.geofence.status().await, GeofenceStatus::Inactive);
    }
}
