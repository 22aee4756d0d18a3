use console_core::{DashboardEvent, Severity};
use shared::domain::{Employee, Office};
use tokio::sync::broadcast;

pub fn employees(employees: &[Employee]) {
    if employees.is_empty() {
        println!("no employees");
        return;
    }
    println!(
        "{:>5}  {:<28} {:<10} {:<12} {:<12} {}",
        "id", "name", "dni", "phone", "birth date", "offices"
    );
    for employee in employees {
        println!(
            "{:>5}  {:<28} {:<10} {:<12} {:<12} {}",
            employee.id,
            employee.full_name(),
            employee.dni,
            employee.phone,
            employee.birth_date_display(),
            employee.office_names_display()
        );
    }
}

pub fn offices(offices: &[Office]) {
    if offices.is_empty() {
        println!("no offices");
        return;
    }
    println!("{:>5}  {:<24} {}", "id", "name", "location");
    for office in offices {
        println!("{:>5}  {:<24} {}", office.id, office.name, office.location);
    }
}

pub fn employee_detail(employee: &Employee) {
    println!("id:         {}", employee.id);
    println!("name:       {}", employee.full_name());
    println!("dni:        {}", employee.dni);
    println!("phone:      {}", employee.phone);
    println!("address:    {}", employee.address);
    println!("birth date: {}", employee.birth_date_display());
    println!("offices:    {}", employee.office_names_display());
}

/// Prints every queued notification to stderr.
pub fn drain_notifications(events: &mut broadcast::Receiver<DashboardEvent>) {
    loop {
        match events.try_recv() {
            Ok(DashboardEvent::Notification(notification)) => {
                let tag = match notification.severity {
                    Severity::Success => "ok",
                    Severity::Warning => "warning",
                    Severity::Error => "error",
                };
                match notification.detail {
                    Some(detail) => eprintln!("[{tag}] {}: {detail}", notification.title),
                    None => eprintln!("[{tag}] {}", notification.title),
                }
            }
            Ok(DashboardEvent::SessionEnded) => eprintln!("[session] signed out"),
            Ok(_) => {}
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                eprintln!("[warning] {skipped} notifications dropped");
            }
            Err(_) => break,
        }
    }
}
