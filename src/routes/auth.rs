use log::warn;
use rocket::State;
use rocket::form::Form;
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{Template, context};
use validator::Validate;

use super::Page;
use crate::guards::RequestSession;
use crate::models::SignupOutcome;
use crate::services::{BackendHandle, GatewayError};
use crate::utils::{TRY_AGAIN, Toast, normalize_email, validate_email};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, FromForm, Validate)]
pub struct SignupForm {
    #[validate(length(min = 1, message = "Please enter your name."))]
    pub name: String,
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters."))]
    pub password: String,
}

impl SignupForm {
    /// First problem with the submitted fields, worded for the user.
    fn check(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Please enter your name.".to_string());
        }
        if !validate_email(&self.email) {
            return Err("Please enter a valid email address.".to_string());
        }
        self.validate().map_err(|errors| {
            errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .unwrap_or_else(|| "Please check the form.".to_string())
        })
    }
}

fn login_template(email: &str, error: Option<&str>, toast: Option<Toast>, signup: bool) -> Template {
    Template::render(
        "login",
        context! {
            title: "Sign in",
            email,
            error,
            toast,
            signup_enabled: signup,
        },
    )
}

fn signup_template(name: &str, email: &str, error: Option<&str>) -> Template {
    Template::render(
        "signup",
        context! {
            title: "Create account",
            name,
            email,
            error,
        },
    )
}

#[get("/login")]
pub fn login_page(backend: &State<BackendHandle>, flash: Option<FlashMessage<'_>>) -> Template {
    login_template(
        "",
        None,
        Toast::from_flash(flash),
        backend.auth().supports_signup(),
    )
}

#[post("/login", data = "<form>")]
pub async fn login(
    session: RequestSession<'_>,
    backend: &State<BackendHandle>,
    form: Form<LoginForm>,
) -> Page {
    let email = normalize_email(&form.email);
    if email.is_empty() || form.password.is_empty() || !session.login(&email, &form.password).await {
        return login_template(
            &form.email,
            Some(INVALID_CREDENTIALS),
            None,
            backend.auth().supports_signup(),
        )
        .into();
    }

    Toast::success("Welcome back!", "You've been successfully logged in.")
        .redirect("/")
        .into()
}

#[get("/signup")]
pub fn signup_page(backend: &State<BackendHandle>) -> Page {
    if !backend.auth().supports_signup() {
        return Toast::error("Sign up unavailable", "Accounts are created by an administrator.")
            .redirect("/login")
            .into();
    }
    signup_template("", "", None).into()
}

#[post("/signup", data = "<form>")]
pub async fn signup(session: RequestSession<'_>, form: Form<SignupForm>) -> Page {
    if let Err(message) = form.check() {
        return signup_template(&form.name, &form.email, Some(message.as_str())).into();
    }

    let email = normalize_email(&form.email);
    match session.signup(&email, &form.password, &form.name).await {
        Ok(SignupOutcome::SignedIn(_)) => Toast::success(
            "Account created",
            "Welcome to EcoWaste!",
        )
        .redirect("/")
        .into(),
        Ok(SignupOutcome::ConfirmationRequired) => Toast::success(
            "Check your email",
            "Confirm your address, then sign in.",
        )
        .redirect("/login")
        .into(),
        Err(GatewayError::Rejected(message)) => {
            signup_template(&form.name, &form.email, Some(message.as_str())).into()
        }
        Err(e) => {
            warn!("Signup failed: {}", e);
            signup_template(&form.name, &form.email, Some(TRY_AGAIN)).into()
        }
    }
}

#[post("/logout")]
pub async fn logout(session: RequestSession<'_>) -> Flash<Redirect> {
    session.logout().await;
    Toast::success("Signed out", "See you soon.").redirect("/login")
}
