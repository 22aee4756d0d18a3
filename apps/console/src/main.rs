mod render;

use std::{collections::BTreeSet, path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use console_core::{
    config::normalize_base_path, load_settings, load_settings_file, DashboardController,
    EmployeeForm, OfficeForm,
};
use shared::domain::{EmployeeId, OfficeId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(about = "Employee and office management console")]
struct Cli {
    /// Settings file; defaults to ./console.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    base_path: Option<String>,
    #[arg(long, short)]
    username: Option<String>,
    #[arg(long, short)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates an account; does not sign in.
    Register { username: String, password: String },
    Employees,
    Offices,
    AddEmployee(EmployeeFields),
    UpdateEmployee {
        id: i64,
        #[command(flatten)]
        fields: EmployeeFields,
    },
    AddOffice(OfficeFields),
    UpdateOffice {
        id: i64,
        #[command(flatten)]
        fields: OfficeFields,
    },
    /// Replaces the employee's offices with exactly the given set.
    Assign {
        employee_id: i64,
        office_ids: Vec<i64>,
    },
    DeleteEmployee {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    DeleteOffice {
        id: i64,
        #[arg(long)]
        yes: bool,
    },
    Search { id: String },
}

#[derive(ClapArgs, Debug, Default)]
struct EmployeeFields {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    dni: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    birth_date: Option<String>,
}

impl EmployeeFields {
    fn apply(self, form: &mut EmployeeForm) {
        let targets = [
            (self.first_name, &mut form.first_name),
            (self.last_name, &mut form.last_name),
            (self.phone, &mut form.phone),
            (self.dni, &mut form.dni),
            (self.address, &mut form.address),
            (self.birth_date, &mut form.birth_date),
        ];
        for (value, target) in targets {
            if let Some(value) = value {
                *target = value;
            }
        }
    }
}

#[derive(ClapArgs, Debug, Default)]
struct OfficeFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    location: Option<String>,
}

impl OfficeFields {
    fn apply(self, form: &mut OfficeForm) {
        if let Some(name) = self.name {
            form.name = name;
        }
        if let Some(location) = self.location {
            form.location = location;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_settings_file(path)?,
        None => load_settings(),
    };
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    if let Some(base_path) = cli.base_path {
        settings.base_path = normalize_base_path(&base_path);
    }
    let session = console_core::connect(&settings)?;

    if let Command::Register { username, password } = &cli.command {
        session.register(username, password).await?;
        println!("registered {username}; sign in with --username/--password");
        return Ok(());
    }

    let (Some(username), Some(password)) = (cli.username, cli.password) else {
        bail!("--username and --password are required for this command");
    };
    session.login(&username, &password).await?;
    info!(
        user = session.signed_in_as().await.as_deref().unwrap_or(&username),
        "console: signed in"
    );

    let dashboard = DashboardController::new(Arc::clone(&session));
    let mut events = dashboard.subscribe_events();
    let outcome = run(&dashboard, cli.command).await;
    render::drain_notifications(&mut events);
    dashboard.unmount().await;
    session.logout().await;
    outcome
}

async fn run(dashboard: &Arc<DashboardController>, command: Command) -> Result<()> {
    dashboard.mount().await?;

    match command {
        Command::Register { .. } => {}
        Command::Employees => {
            render::employees(&dashboard.snapshot().await.employees);
        }
        Command::Offices => {
            render::offices(&dashboard.snapshot().await.offices);
        }
        Command::AddEmployee(fields) => {
            let mut form = EmployeeForm::default();
            fields.apply(&mut form);
            dashboard.submit_employee(form, None).await?;
            render::employees(&dashboard.snapshot().await.employees);
        }
        Command::UpdateEmployee { id, fields } => {
            dashboard.edit_employee(EmployeeId(id)).await?;
            let mut form = dashboard.snapshot().await.employee_draft.form;
            fields.apply(&mut form);
            dashboard.set_employee_draft(form).await;
            dashboard.submit_employee_draft().await?;
            render::employees(&dashboard.snapshot().await.employees);
        }
        Command::AddOffice(fields) => {
            let mut form = OfficeForm::default();
            fields.apply(&mut form);
            dashboard.submit_office(form, None).await?;
            render::offices(&dashboard.snapshot().await.offices);
        }
        Command::UpdateOffice { id, fields } => {
            dashboard.edit_office(OfficeId(id)).await?;
            let mut form = dashboard.snapshot().await.office_draft.form;
            fields.apply(&mut form);
            dashboard.set_office_draft(form).await;
            dashboard.submit_office_draft().await?;
            render::offices(&dashboard.snapshot().await.offices);
        }
        Command::Assign {
            employee_id,
            office_ids,
        } => {
            let office_ids: BTreeSet<OfficeId> = office_ids.into_iter().map(OfficeId).collect();
            dashboard
                .assign(Some(EmployeeId(employee_id)), office_ids)
                .await?;
            render::employees(&dashboard.snapshot().await.employees);
        }
        Command::DeleteEmployee { id, yes } => {
            dashboard.delete_employee(EmployeeId(id)).await;
            confirm_or_cancel(dashboard, yes).await?;
        }
        Command::DeleteOffice { id, yes } => {
            dashboard.delete_office(OfficeId(id)).await;
            confirm_or_cancel(dashboard, yes).await?;
        }
        Command::Search { id } => {
            let employee = dashboard.search_employee_by_id(&id).await?;
            render::employee_detail(&employee);
        }
    }

    Ok(())
}

async fn confirm_or_cancel(dashboard: &DashboardController, assume_yes: bool) -> Result<()> {
    let Some(target) = dashboard.pending_deletion().await else {
        return Ok(());
    };
    if assume_yes || ask(&format!("delete {target}? [y/N] ")).await? {
        dashboard.confirm_deletion().await?;
    } else {
        dashboard.cancel_deletion().await;
        println!("cancelled; nothing was deleted");
    }
    Ok(())
}

async fn ask(prompt: &str) -> Result<bool> {
    eprint!("{prompt}");
    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
