use std::sync::Arc;

use clap::{Parser, Subcommand};
use klinik_core::config::page_size_from_env_value;
use klinik_core::format::format_idr;
use klinik_core::services::patients::{PatientService, RegisterPatient};
use klinik_core::services::records::RecordService;
use klinik_core::services::visits::{EnqueueVisit, VisitFilter, VisitService};
use klinik_core::{constants, CoreConfig, RecordStoreClient, RequestContext};
use klinik_types::{Entry, Gender, OutpatientFields, VisitStatus};

#[derive(Parser)]
#[command(name = "klinik")]
#[command(about = "Clinic outpatient management CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the token to export
    Login {
        /// Username or email
        identifier: String,
        /// Password
        password: String,
    },
    /// List patients
    Patients {
        /// Search by name or RM number
        #[arg(long)]
        search: Option<String>,
        /// Page number, 1-based
        #[arg(long)]
        page: Option<u32>,
    },
    /// Register a patient
    Register {
        /// Full name
        name: String,
        /// Date of birth (YYYY-MM-DD)
        dob: String,
        /// Medical record number (optional)
        #[arg(long)]
        rm_id: Option<String>,
        /// Home address (optional)
        #[arg(long)]
        address: Option<String>,
        /// Phone number (optional)
        #[arg(long)]
        phone: Option<String>,
        /// male, female or others (optional)
        #[arg(long)]
        gender: Option<String>,
    },
    /// Queue a visit
    Queue {
        /// Patient id
        patient: u64,
        /// Doctor id
        doctor: u64,
        /// Polyclinic id
        polyclinic: u64,
    },
    /// List visits
    Visits {
        /// Search by patient or doctor name
        #[arg(long)]
        search: Option<String>,
        /// Filter by status (in_queue, in_progress, waiting_for_payment, done, canceled_by_admin)
        #[arg(long)]
        status: Option<String>,
        /// Page number, 1-based
        #[arg(long)]
        page: Option<u32>,
    },
    /// Start processing a queued visit
    Start {
        /// Visit id
        visit: u64,
    },
    /// Cancel a queued visit
    Cancel {
        /// Visit id
        visit: u64,
    },
    /// Send an examined visit to payment
    ToPayment {
        /// Visit id
        visit: u64,
    },
    /// Close a visit once payment is settled
    Done {
        /// Visit id
        visit: u64,
    },
    /// Print a visit's invoice
    Invoice {
        /// Visit id
        visit: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let store_url = std::env::var("RECORD_STORE_URL")
        .unwrap_or_else(|_| constants::DEFAULT_RECORD_STORE_URL.into());
    let page_size = page_size_from_env_value(std::env::var("KLINIK_PAGE_SIZE").ok())?;
    let cfg = Arc::new(CoreConfig::new(store_url, page_size)?);
    let client = Arc::new(RecordStoreClient::new(cfg.record_store_url())?);

    match cli.command {
        Some(Commands::Login {
            identifier,
            password,
        }) => match client.login(&identifier, &password).await {
            Ok(auth) => {
                match client.own_account(&auth.jwt).await {
                    Ok(account) => match account.organization {
                        Some(org) => println!(
                            "Logged in to {} (organization {})",
                            org.name.as_deref().unwrap_or("unnamed"),
                            org.id
                        ),
                        None => println!("Logged in, but the account has no organization"),
                    },
                    Err(e) => eprintln!("Error reading account: {}", e),
                }
                println!("export KLINIK_API_TOKEN={}", auth.jwt);
            }
            Err(e) => eprintln!("Error logging in: {}", e),
        },
        Some(Commands::Patients { search, page }) => {
            let ctx = resolve_context(&client).await?;
            let service = PatientService::new(client.clone(), cfg.clone());
            match service
                .list(&ctx, search.as_deref(), page.unwrap_or(1))
                .await
            {
                Ok(listing) => {
                    if listing.data.is_empty() {
                        println!("No patients found.");
                    } else {
                        for patient in &listing.data {
                            println!(
                                "ID: {}, RM: {}, Name: {}",
                                patient.id,
                                patient.attributes.rm_id.as_deref().unwrap_or("-"),
                                patient.attributes.name
                            );
                        }
                        if let Some(pagination) = &listing.meta.pagination {
                            println!(
                                "Page {}/{} ({} patients)",
                                pagination.page, pagination.page_count, pagination.total
                            );
                        }
                    }
                }
                Err(e) => eprintln!("Error listing patients: {}", e),
            }
        }
        Some(Commands::Register {
            name,
            dob,
            rm_id,
            address,
            phone,
            gender,
        }) => {
            let ctx = resolve_context(&client).await?;
            let gender = match gender.as_deref().map(parse_gender).transpose() {
                Ok(gender) => gender,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(());
                }
            };
            let service = PatientService::new(client.clone(), cfg.clone());
            match service
                .register(
                    &ctx,
                    RegisterPatient {
                        name,
                        dob,
                        rm_id,
                        address,
                        phone,
                        gender,
                    },
                )
                .await
            {
                Ok(patient) => println!(
                    "Registered patient {} with ID: {}",
                    patient.attributes.name, patient.id
                ),
                Err(e) => eprintln!("Error registering patient: {}", e),
            }
        }
        Some(Commands::Queue {
            patient,
            doctor,
            polyclinic,
        }) => {
            let ctx = resolve_context(&client).await?;
            let service = VisitService::new(client.clone(), cfg.clone());
            match service
                .enqueue(
                    &ctx,
                    EnqueueVisit {
                        patient,
                        doctor,
                        polyclinic,
                    },
                )
                .await
            {
                Ok(visit) => println!(
                    "Queued visit {} (status: {})",
                    visit.id, visit.attributes.status
                ),
                Err(e) => eprintln!("Error queueing visit: {}", e),
            }
        }
        Some(Commands::Visits {
            search,
            status,
            page,
        }) => {
            let ctx = resolve_context(&client).await?;
            let status = match status.as_deref().map(str::parse::<VisitStatus>).transpose() {
                Ok(status) => status,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return Ok(());
                }
            };
            let service = VisitService::new(client.clone(), cfg.clone());
            match service
                .list(
                    &ctx,
                    VisitFilter {
                        search,
                        status,
                        page: page.unwrap_or(1),
                    },
                )
                .await
            {
                Ok(listing) => {
                    if listing.data.is_empty() {
                        println!("No visits found.");
                    } else {
                        for visit in &listing.data {
                            print_visit_row(visit);
                        }
                        if let Some(pagination) = &listing.meta.pagination {
                            println!(
                                "Page {}/{} ({} visits)",
                                pagination.page, pagination.page_count, pagination.total
                            );
                        }
                    }
                }
                Err(e) => eprintln!("Error listing visits: {}", e),
            }
        }
        Some(Commands::Start { visit }) => {
            let ctx = resolve_context(&client).await?;
            let service = VisitService::new(client.clone(), cfg.clone());
            match service.start_processing(&ctx, visit).await {
                Ok(updated) => println!("Visit {} is now {}", updated.id, updated.attributes.status),
                Err(e) => eprintln!("Error starting visit: {}", e),
            }
        }
        Some(Commands::Cancel { visit }) => {
            let ctx = resolve_context(&client).await?;
            let service = VisitService::new(client.clone(), cfg.clone());
            match service.cancel(&ctx, visit).await {
                Ok(updated) => println!("Visit {} is now {}", updated.id, updated.attributes.status),
                Err(e) => eprintln!("Error canceling visit: {}", e),
            }
        }
        Some(Commands::ToPayment { visit }) => {
            let ctx = resolve_context(&client).await?;
            let service = VisitService::new(client.clone(), cfg.clone());
            match service.advance_to_payment(&ctx, visit).await {
                Ok(updated) => println!("Visit {} is now {}", updated.id, updated.attributes.status),
                Err(e) => eprintln!("Error advancing visit: {}", e),
            }
        }
        Some(Commands::Done { visit }) => {
            let ctx = resolve_context(&client).await?;
            let service = VisitService::new(client.clone(), cfg.clone());
            match service.mark_done(&ctx, visit).await {
                Ok(updated) => println!("Visit {} is now {}", updated.id, updated.attributes.status),
                Err(e) => eprintln!("Error closing visit: {}", e),
            }
        }
        Some(Commands::Invoice { visit }) => {
            let ctx = resolve_context(&client).await?;
            let service = RecordService::new(client.clone());
            match service.invoice(&ctx, visit).await {
                Ok(invoice) => {
                    if !invoice.drug_lines.is_empty() {
                        println!("Drugs:");
                        for line in &invoice.drug_lines {
                            println!(
                                "  {}  {} x {} = {}",
                                line.label,
                                line.qty,
                                format_idr(line.unit_price),
                                format_idr(line.total)
                            );
                        }
                    }
                    if !invoice.treatment_lines.is_empty() {
                        println!("Treatments:");
                        for line in &invoice.treatment_lines {
                            println!(
                                "  {}  {} x {} = {}",
                                line.label,
                                line.qty,
                                format_idr(line.unit_price),
                                format_idr(line.total)
                            );
                        }
                    }
                    println!("Total: {}", format_idr(invoice.grand_total));
                }
                Err(e) => eprintln!("Error building invoice: {}", e),
            }
        }
        None => {
            println!("Use 'klinik --help' for commands");
        }
    }

    Ok(())
}

/// Credentials for scoped commands: token from `KLINIK_API_TOKEN`, the
/// organization from `KLINIK_ORG_ID` or, failing that, the account lookup.
async fn resolve_context(
    client: &RecordStoreClient,
) -> Result<RequestContext, Box<dyn std::error::Error>> {
    let token = std::env::var("KLINIK_API_TOKEN")
        .map_err(|_| "KLINIK_API_TOKEN is not set; run 'klinik login' first")?;
    let organization = match std::env::var("KLINIK_ORG_ID")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
    {
        Some(id) => id,
        None => {
            let account = client.own_account(&token).await?;
            account
                .organization
                .map(|org| org.id)
                .ok_or("the account has no organization")?
        }
    };
    Ok(RequestContext::new(token, organization))
}

fn parse_gender(value: &str) -> Result<Gender, String> {
    match value.to_lowercase().as_str() {
        "male" => Ok(Gender::Male),
        "female" => Ok(Gender::Female),
        "others" => Ok(Gender::Others),
        other => Err(format!("unknown gender: {}", other)),
    }
}

fn print_visit_row(visit: &Entry<OutpatientFields>) {
    let attrs = &visit.attributes;
    let patient = attrs
        .patient
        .entry()
        .map(|entry| entry.attributes.name.as_str())
        .unwrap_or("-");
    let doctor = attrs
        .doctor
        .entry()
        .map(|entry| entry.attributes.name.as_str())
        .unwrap_or("-");
    let appointment = attrs
        .appointment_date
        .or(attrs.created_at)
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "ID: {}, Status: {}, Patient: {}, Doctor: {}, Appointment: {}",
        visit.id, attrs.status, patient, doctor, appointment
    );
}
