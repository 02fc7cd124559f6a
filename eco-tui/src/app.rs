use std::sync::Arc;

use chrono::{DateTime, Local};
use eco_core::{
    account::{AccountService, RegistrationForm},
    diagnostics::Diagnostic,
    model::MaterialSelection,
    presentation::MapPresentation,
    service::MapOrchestrator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Main,
    Login,
    Register,
    RecyclerProfile,
    CollectorProfile,
    Map,
}

/// Current screen target.
#[derive(Debug)]
pub(crate) struct Navigator {
    current: Screen,
}

impl Navigator {
    pub(crate) fn new() -> Self {
        Self {
            current: Screen::Main,
        }
    }

    pub(crate) fn current(&self) -> Screen {
        self.current
    }

    pub(crate) fn navigate_to(&mut self, screen: Screen) {
        self.current = screen;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuItem {
    Login,
    Register,
    Recyclers,
    Collectors,
    Status,
    Logout,
}

impl MenuItem {
    pub(crate) fn label(self) -> &'static str {
        match self {
            MenuItem::Login => "Log in",
            MenuItem::Register => "Register",
            MenuItem::Recyclers => "Recyclers",
            MenuItem::Collectors => "Collectors",
            MenuItem::Status => "Backend status",
            MenuItem::Logout => "Log out",
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct LoginInput {
    pub username: String,
    pub password: String,
    pub field: usize,
}

impl LoginInput {
    pub(crate) const FIELDS: usize = 2;

    /// Username and password exactly as typed.
    pub(crate) fn credentials(&self) -> (String, String) {
        (self.username.clone(), self.password.clone())
    }

    pub(crate) fn focused(&mut self) -> &mut String {
        if self.field == 0 {
            &mut self.username
        } else {
            &mut self.password
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RegisterInput {
    pub form: RegistrationForm,
    pub field: usize,
}

impl RegisterInput {
    pub(crate) const LABELS: [&'static str; 6] = [
        "Username",
        "Last name",
        "E-mail",
        "Address",
        "Password",
        "Confirm password",
    ];

    pub(crate) fn value(&self, field: usize) -> &str {
        let form = &self.form;
        match field {
            0 => &form.username,
            1 => &form.lastname,
            2 => &form.email,
            3 => &form.address,
            4 => &form.password,
            _ => &form.confirm_password,
        }
    }

    pub(crate) fn focused(&mut self) -> &mut String {
        let form = &mut self.form;
        match self.field {
            0 => &mut form.username,
            1 => &mut form.lastname,
            2 => &mut form.email,
            3 => &mut form.address,
            4 => &mut form.password,
            _ => &mut form.confirm_password,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecyclerInput {
    pub selection: MaterialSelection,
    pub index: usize,
}

impl RecyclerInput {
    pub(crate) const LABELS: [&'static str; 5] = ["Glass", "Metal", "Plastic", "Cardboard", "All kinds"];

    pub(crate) fn is_checked(&self, index: usize) -> bool {
        let selection = &self.selection;
        match index {
            0 => selection.glass,
            1 => selection.metal,
            2 => selection.plastic,
            3 => selection.cardboard,
            _ => selection.is_all(),
        }
    }

    pub(crate) fn toggle_current(&mut self) {
        let selection = &mut self.selection;
        match self.index {
            0 => selection.glass = !selection.glass,
            1 => selection.metal = !selection.metal,
            2 => selection.plastic = !selection.plastic,
            3 => selection.cardboard = !selection.cardboard,
            _ => {
                *selection = if selection.is_all() {
                    MaterialSelection::default()
                } else {
                    MaterialSelection::all()
                };
            }
        }
    }
}

pub(crate) struct App {
    pub accounts: Arc<AccountService>,
    pub orchestrator: Arc<MapOrchestrator>,

    pub navigator: Navigator,
    pub menu_index: usize,

    pub login: LoginInput,
    pub register: RegisterInput,
    pub recycler: RecyclerInput,

    pub map: MapPresentation,
    pub marker_index: usize,
    pub last_refresh: Option<DateTime<Local>>,
    pub last_diagnostic: Option<Diagnostic>,

    pub is_loading: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
}

impl App {
    pub(crate) fn new(accounts: Arc<AccountService>, orchestrator: Arc<MapOrchestrator>) -> Self {
        Self {
            accounts,
            orchestrator,
            navigator: Navigator::new(),
            menu_index: 0,
            login: LoginInput::default(),
            register: RegisterInput::default(),
            recycler: RecyclerInput::default(),
            map: MapPresentation::new(),
            marker_index: 0,
            last_refresh: None,
            last_diagnostic: None,
            is_loading: false,
            error_message: None,
            info_message: None,
        }
    }

    pub(crate) fn screen(&self) -> Screen {
        self.navigator.current()
    }

    pub(crate) fn is_logged_in(&self) -> bool {
        self.accounts.session().is_logged_in()
    }

    pub(crate) fn username(&self) -> Option<String> {
        self.accounts.session().username()
    }

    pub(crate) fn menu(&self) -> Vec<MenuItem> {
        if self.is_logged_in() {
            vec![
                MenuItem::Recyclers,
                MenuItem::Collectors,
                MenuItem::Status,
                MenuItem::Logout,
            ]
        } else {
            vec![MenuItem::Login, MenuItem::Register, MenuItem::Status]
        }
    }

    /// Switch screens. The login screen bounces back to main when a session exists.
    pub(crate) fn go_to(&mut self, screen: Screen) {
        let target = if screen == Screen::Login && self.is_logged_in() {
            tracing::debug!(user = ?self.username(), "already logged in");
            Screen::Main
        } else {
            screen
        };
        if target == Screen::Main {
            self.menu_index = 0;
        }
        self.navigator.navigate_to(target);
    }

    pub(crate) fn clear_messages(&mut self) {
        self.error_message = None;
        self.info_message = None;
    }

    /// Keep the marker cursor inside the current marker list.
    pub(crate) fn clamp_marker_index(&mut self) {
        let count = self.map.state().markers.len();
        if self.marker_index >= count {
            self.marker_index = count.saturating_sub(1);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use eco_core::{
        diagnostics::Diagnostics, geolocation::GeolocationProvider, ports::SessionStore,
        session::MemorySessionStore,
    };
    use eco_provider_openroute::OpenRouteClient;
    use reqwest::Client;

    use super::*;
    use crate::config::LocationConfig;
    use crate::platform::ConfiguredLocation;

    // Nothing listens here; screen logic never reaches the network.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    pub(crate) fn app_with_session(session: Arc<MemorySessionStore>) -> App {
        let backend = eco_provider_backend::ports(Client::new(), UNREACHABLE);
        let location = ConfiguredLocation::new(LocationConfig {
            permission: true,
            gps_enabled: true,
            fixes: Vec::new(),
        });
        let orchestrator = MapOrchestrator::new(
            backend.recycling,
            Arc::new(OpenRouteClient::new(Client::new(), UNREACHABLE, "")),
            Arc::new(GeolocationProvider::new(Arc::new(location))),
            Diagnostics::new(),
        );
        App::new(
            Arc::new(AccountService::new(backend.account, session)),
            Arc::new(orchestrator),
        )
    }

    pub(crate) fn logged_out_app() -> App {
        app_with_session(Arc::new(MemorySessionStore::default()))
    }

    fn logged_in_app(username: &str) -> App {
        let session = MemorySessionStore::default();
        session.save(username).expect("save");
        app_with_session(Arc::new(session))
    }

    #[test]
    fn login_screen_bounces_to_main_with_a_session() {
        let mut app = logged_in_app("lucia");
        app.go_to(Screen::RecyclerProfile);

        app.go_to(Screen::Login);

        assert_eq!(app.screen(), Screen::Main);
        assert_eq!(app.username().as_deref(), Some("lucia"));
    }

    #[test]
    fn login_screen_opens_without_a_session() {
        let mut app = logged_out_app();
        app.go_to(Screen::Login);
        assert_eq!(app.screen(), Screen::Login);
    }

    #[test]
    fn returning_to_main_resets_the_menu_cursor() {
        let mut app = logged_out_app();
        app.menu_index = 2;
        app.go_to(Screen::Register);
        app.go_to(Screen::Main);
        assert_eq!(app.menu_index, 0);
    }

    #[test]
    fn menu_depends_on_session() {
        assert_eq!(
            logged_out_app().menu(),
            vec![MenuItem::Login, MenuItem::Register, MenuItem::Status]
        );
        assert_eq!(
            logged_in_app("lucia").menu(),
            vec![
                MenuItem::Recyclers,
                MenuItem::Collectors,
                MenuItem::Status,
                MenuItem::Logout,
            ]
        );
    }

    #[test]
    fn credentials_are_sent_as_typed() {
        let login = LoginInput {
            username: " lucia ".to_owned(),
            password: " pw".to_owned(),
            field: 0,
        };
        assert_eq!(login.credentials(), (" lucia ".to_owned(), " pw".to_owned()));
    }

    #[test]
    fn all_kinds_toggles_every_material() {
        let mut input = RecyclerInput {
            index: 4,
            ..RecyclerInput::default()
        };
        input.toggle_current();
        assert!(input.selection.is_all());
        assert!(input.is_checked(4));

        input.index = 1;
        input.toggle_current();
        assert!(!input.selection.metal);
        assert!(!input.is_checked(4));

        input.index = 4;
        input.toggle_current();
        assert!(input.selection.is_all());
        input.toggle_current();
        assert!(input.selection.is_empty());
    }

    #[test]
    fn register_fields_map_to_form() {
        let mut input = RegisterInput::default();
        input.field = 2;
        input.focused().push_str("a@b.co");
        assert_eq!(input.form.email, "a@b.co");
        assert_eq!(input.value(2), "a@b.co");
    }
}
