use std::path::PathBuf;
use std::time::SystemTime;

use anyhow::Result;
use employee_client::employee_proto::{Employee, EmployeeRequest, EmployeeStatus, MonthSalary};
use employee_client::{
    CallMetadata, ClientConfig, Credentials, EmployeeClient, GrpcChannel, Outcome, Photo, Workload,
};
use tracing::{Level, error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let endpoint = std::env::var("EMPLOYEE_ENDPOINT")
        .unwrap_or_else(|_| employee_client::client::DEFAULT_ENDPOINT.to_string());
    let username = std::env::var("EMPLOYEE_USERNAME").unwrap_or_else(|_| "admin".to_string());
    let password = std::env::var("EMPLOYEE_PASSWORD")?;
    let photo = std::env::var("EMPLOYEE_PHOTO").unwrap_or_else(|_| "photo.jpg".to_string());
    let option = std::env::args().nth(1).unwrap_or_else(|| "1".to_string());

    info!(endpoint = %endpoint, option = %option, "Client starting");

    let config = ClientConfig::builder()
        .endpoint(endpoint)
        .credentials(Credentials::new(username, password))
        .unary_headers(
            CallMetadata::new()
                .with("username", "kael.tian")
                .with("age", "18")
                .with("level", "GL8"),
        )
        .upload_headers(
            CallMetadata::new()
                .with("username", "kael.tian")
                .with("age", "18"),
        )
        .exchange_headers(
            CallMetadata::new()
                .with("client", "10.2.39.38")
                .with("message", "I am client"),
        )
        .build();

    let channel = GrpcChannel::connect(&config).await?;
    let client = EmployeeClient::new(channel, config);

    let workload = Workload {
        employee_no: 1994,
        photo: Photo::File(PathBuf::from(photo)),
        records: sample_records(),
    };

    // Failures are already classified and logged by the client.
    match client.run_option(&option, &workload).await {
        Ok(Outcome::Skipped) => {}
        Ok(outcome) => info!(?outcome, "Interaction finished"),
        Err(e) => error!(error = %e, "Interaction failed"),
    }

    Ok(())
}

fn sample_records() -> Vec<EmployeeRequest> {
    let now = prost_types::Timestamp::from(SystemTime::now());
    let employee = |id, no, first: &str, last: &str, status: EmployeeStatus, basic, bonus| {
        EmployeeRequest {
            employee: Some(Employee {
                id,
                no,
                first_name: first.to_string(),
                last_name: last.to_string(),
                salary: Some(MonthSalary { basic, bonus }),
                status: status.into(),
                last_modified: Some(now.clone()),
            }),
        }
    };

    vec![
        employee(10, 111, "guo", "degang", EmployeeStatus::Normal, 123.0, 10000.0),
        employee(20, 222, "yu", "qian", EmployeeStatus::OnVacation, 222.0, 100066660.0),
        employee(30, 333, "wei", "lihang", EmployeeStatus::Resigned, 22.3, 1234.0),
    ]
}
