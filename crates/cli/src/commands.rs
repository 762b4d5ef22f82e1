//! CLI commands

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde::Serialize;
use std::io::{self, BufRead};
use std::sync::Arc;
use studio_core::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, LoginRequest, Profile, Role,
    ServiceCategory, ServiceRequest, SignupRequest, UpdateProfileRequest,
};
use studio_http::client::{FileTokenStore, Session};
use studio_http::{ClientConfig, ClientError, LoginRedirect, StudioClientBuilder, TokenStore};
use tracing::{info, warn};

use crate::config::StateDir;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        username: String,

        /// Password (read from stdin when not given)
        #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create a client account
    Signup {
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: Option<String>,

        /// Password (read from stdin when not given)
        #[arg(long, env = "STUDIO_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in profile
    Whoami,

    /// Change your contact details
    UpdateProfile {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Service catalogue
    Services {
        #[command(subcommand)]
        command: ServiceCommands,
    },

    /// Appointment bookings
    Appointments {
        #[command(subcommand)]
        command: AppointmentCommands,
    },

    /// Client accounts (staff only)
    Clients {
        #[command(subcommand)]
        command: ClientCommands,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    /// List services
    List {
        /// Include inactive services (staff only)
        #[arg(long)]
        all: bool,
    },

    /// Add a service
    Create {
        name: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        price: f64,

        /// Duration in minutes
        #[arg(long)]
        duration: u32,

        /// BRIDAL, PARTY, EVERYDAY, PHOTOSHOOT or SPECIAL_FX
        #[arg(long, value_parser = parse_category)]
        category: ServiceCategory,

        /// Create the service inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Replace a service's details
    Update {
        id: i64,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        price: f64,

        /// Duration in minutes
        #[arg(long)]
        duration: u32,

        #[arg(long, value_parser = parse_category)]
        category: ServiceCategory,

        /// Mark the service inactive
        #[arg(long)]
        inactive: bool,
    },

    /// Activate or deactivate a service
    Toggle {
        id: i64,

        #[arg(long)]
        active: bool,
    },

    /// Remove a service
    Delete { id: i64 },
}

#[derive(Subcommand)]
pub enum AppointmentCommands {
    /// List appointments
    List {
        /// Only your own bookings
        #[arg(long)]
        mine: bool,
    },

    /// Book an appointment
    Book {
        /// Start time, RFC 3339 (e.g. 2025-06-01T10:00:00Z)
        #[arg(long)]
        date: DateTime<Utc>,

        /// Service ids, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        services: Vec<i64>,

        /// Book on behalf of a client (staff only)
        #[arg(long)]
        client_id: Option<i64>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Move an appointment to a new status (staff only)
    Status {
        id: i64,

        /// SCHEDULED, CONFIRMED, IN_PROGRESS, COMPLETED, CANCELLED or NO_SHOW
        #[arg(value_parser = parse_status)]
        status: AppointmentStatus,
    },

    /// Cancel an appointment
    Cancel { id: i64 },
}

#[derive(Subcommand)]
pub enum ClientCommands {
    /// List client accounts
    List,

    /// Give a client staff access
    Promote { id: i64 },
}

impl Commands {
    /// Short name used in logs and as the CLI's notion of "where the user is"
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Login { .. } => "login",
            Commands::Signup { .. } => "signup",
            Commands::Logout => "logout",
            Commands::Whoami => "whoami",
            Commands::UpdateProfile { .. } => "update-profile",
            Commands::Services { .. } => "services",
            Commands::Appointments { .. } => "appointments",
            Commands::Clients { .. } => "clients",
        }
    }

    pub async fn execute(self, config: ClientConfig, state_dir: StateDir) -> Result<()> {
        let session = open_session(&config, &state_dir, self.name())?;

        match self {
            Commands::Login { username, password } => {
                let password = password_or_stdin(password)?;
                let response = session
                    .login(&LoginRequest { username, password })
                    .await
                    .map_err(friendly("Login failed"))?;
                info!(user = %response.username, "Signed in");
                println!("Signed in as {} ({})", response.username, response.role);
                Ok(())
            }
            Commands::Signup {
                username,
                email,
                first_name,
                last_name,
                phone,
                password,
            } => {
                let password = password_or_stdin(password)?;
                session
                    .signup(&SignupRequest {
                        username: username.clone(),
                        email,
                        password,
                        first_name,
                        last_name,
                        phone,
                    })
                    .await
                    .map_err(friendly("Registration failed"))?;
                println!("Account created. Run `studio login {username}` to sign in.");
                Ok(())
            }
            Commands::Logout => {
                session.logout();
                println!("Signed out");
                Ok(())
            }
            Commands::Whoami => match session.load_profile().await {
                Ok(Some(profile)) => print_json(&profile),
                Ok(None) => {
                    println!("Not signed in");
                    Ok(())
                }
                Err(err) => Err(friendly("Could not load your profile")(err)),
            },
            Commands::UpdateProfile {
                first_name,
                last_name,
                phone,
            } => {
                let profile = session
                    .update_profile(&UpdateProfileRequest {
                        first_name,
                        last_name,
                        phone,
                    })
                    .await
                    .map_err(friendly("Profile update failed"))?;
                print_json(&profile)
            }
            Commands::Services { command } => command.execute(&session).await,
            Commands::Appointments { command } => command.execute(&session).await,
            Commands::Clients { command } => command.execute(&session).await,
        }
    }
}

impl ServiceCommands {
    async fn execute(self, session: &Session) -> Result<()> {
        if !matches!(self, ServiceCommands::List { all: false }) {
            require_staff(session.current_profile().await.as_ref())?;
        }
        let client = session.client();
        match self {
            ServiceCommands::List { all } => {
                let services = if all {
                    client.list_all_services().await
                } else {
                    client.list_services().await
                }
                .map_err(friendly("Could not load services"))?;
                print_json(&services)
            }
            ServiceCommands::Create {
                name,
                description,
                price,
                duration,
                category,
                inactive,
            } => {
                client
                    .create_service(&ServiceRequest {
                        name,
                        description,
                        price,
                        duration_minutes: duration,
                        category,
                        active: !inactive,
                    })
                    .await
                    .map_err(friendly("Could not create service"))?;
                println!("Service created");
                Ok(())
            }
            ServiceCommands::Update {
                id,
                name,
                description,
                price,
                duration,
                category,
                inactive,
            } => {
                client
                    .update_service(
                        id,
                        &ServiceRequest {
                            name,
                            description,
                            price,
                            duration_minutes: duration,
                            category,
                            active: !inactive,
                        },
                    )
                    .await
                    .map_err(friendly("Could not update service"))?;
                println!("Service {id} updated");
                Ok(())
            }
            ServiceCommands::Toggle { id, active } => {
                client
                    .set_service_active(id, active)
                    .await
                    .map_err(friendly("Could not update service"))?;
                println!(
                    "Service {id} {}",
                    if active { "activated" } else { "deactivated" }
                );
                Ok(())
            }
            ServiceCommands::Delete { id } => {
                client
                    .delete_service(id)
                    .await
                    .map_err(friendly("Could not delete service"))?;
                println!("Service {id} deleted");
                Ok(())
            }
        }
    }
}

impl AppointmentCommands {
    async fn execute(self, session: &Session) -> Result<()> {
        if matches!(
            self,
            AppointmentCommands::List { mine: false } | AppointmentCommands::Status { .. }
        ) {
            require_staff(session.current_profile().await.as_ref())?;
        }
        let client = session.client();
        match self {
            AppointmentCommands::List { mine } => {
                let appointments = if mine {
                    client.my_appointments().await
                } else {
                    client.list_appointments().await
                }
                .map_err(friendly("Could not load appointments"))?;
                print_json(&appointments)
            }
            AppointmentCommands::Book {
                date,
                services,
                client_id,
                notes,
            } => {
                client
                    .book_appointment(&CreateAppointmentRequest {
                        appointment_date: date,
                        client_id,
                        service_ids: services,
                        notes,
                    })
                    .await
                    .map_err(friendly("Booking failed"))?;
                println!("Appointment booked for {}", date.to_rfc3339());
                Ok(())
            }
            AppointmentCommands::Status { id, status } => {
                client
                    .update_appointment_status(id, status)
                    .await
                    .map_err(friendly("Could not update appointment"))?;
                println!("Appointment {id} updated");
                Ok(())
            }
            AppointmentCommands::Cancel { id } => {
                let mine = client
                    .my_appointments()
                    .await
                    .map_err(friendly("Could not load appointments"))?;
                ensure_cancellable(&mine, id)?;
                client
                    .cancel_appointment(id)
                    .await
                    .map_err(friendly("Could not cancel appointment"))?;
                println!("Appointment {id} cancelled");
                Ok(())
            }
        }
    }
}

impl ClientCommands {
    async fn execute(self, session: &Session) -> Result<()> {
        require_staff(session.current_profile().await.as_ref())?;
        let client = session.client();
        match self {
            ClientCommands::List => {
                let clients = client
                    .list_clients()
                    .await
                    .map_err(friendly("Could not load clients"))?;
                print_json(&clients)
            }
            ClientCommands::Promote { id } => {
                client
                    .set_user_role(id, Role::Staff)
                    .await
                    .map_err(friendly("Could not change role"))?;
                println!("User {id} is now staff");
                Ok(())
            }
        }
    }
}

/// Tells the user to sign in again once the stored session is gone
struct CliRedirect {
    command: &'static str,
}

impl LoginRedirect for CliRedirect {
    fn current_location(&self) -> Option<String> {
        Some(format!("/{}", self.command))
    }

    fn redirect_to_login(&self) {
        warn!(command = self.command, "Session expired");
        eprintln!("Session expired. Run `studio login <username>` to sign in again.");
    }
}

fn open_session(config: &ClientConfig, state_dir: &StateDir, command: &'static str) -> Result<Session> {
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::in_dir(
        state_dir.data_dir(),
        config.token_ttl(),
    ));
    let client = StudioClientBuilder::from_config(config)
        .token_store(tokens)
        .login_redirect(Arc::new(CliRedirect { command }))
        .build()
        .context("Failed to create API client")?;
    Ok(Session::new(client))
}

fn friendly(fallback: &'static str) -> impl Fn(ClientError) -> anyhow::Error {
    move |err| {
        warn!(error = %err, status = ?err.status(), "Request failed");
        anyhow!(err.user_message(fallback))
    }
}

fn require_staff(profile: Option<&Profile>) -> Result<()> {
    match profile {
        Some(profile) if profile.role.is_staff() => Ok(()),
        Some(profile) => bail!("{} is not a staff account", profile.username),
        None => bail!("Not signed in. Run `studio login <username>` first."),
    }
}

/// Only open bookings can be cancelled. Appointments that are not the
/// caller's own are left for the backend to judge.
fn ensure_cancellable(appointments: &[Appointment], id: i64) -> Result<()> {
    match appointments.iter().find(|appointment| appointment.id == id) {
        Some(appointment) if !appointment.status.is_open() => {
            bail!("Appointment {id} is {:?} and can no longer be cancelled", appointment.status)
        }
        _ => Ok(()),
    }
}

fn password_or_stdin(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn wire_enum<T: serde::de::DeserializeOwned>(value: &str) -> Result<T, String> {
    let name = value.trim().to_uppercase().replace('-', "_");
    serde_json::from_value(serde_json::Value::String(name)).map_err(|e| e.to_string())
}

fn parse_category(value: &str) -> Result<ServiceCategory, String> {
    wire_enum(value)
}

fn parse_status(value: &str) -> Result<AppointmentStatus, String> {
    wire_enum(value)
}
