//! Formatter for session reports

use emv_card::{ApplicationCandidate, ApplicationReport, ApplicationStatus, Directory, SessionReport};
use emv_common::tlv::{self, Tlv};
use emv_common::{TagContext, TagRegistry, render_tlv};

use crate::formatters::{FormatMode, format_value};

/// Format and output a session report
pub fn print_report(report: &SessionReport, mode: FormatMode) {
    println!("\n=== Session Report ({} Mode) ===\n", mode.description());
    println!("State: {}", report.state);
    if let Some(error) = &report.error {
        println!("Error: {error}");
    }

    if let Some(directory) = &report.directory {
        print_directory(directory, mode);
    }

    for application in &report.applications {
        print_application(application, mode);
    }
}

fn print_directory(directory: &Directory, mode: FormatMode) {
    println!("\n=== Payment System Directory ===\n");
    println!("Name: {}", String::from_utf8_lossy(&directory.name));
    if let Some(sfi) = directory.sfi {
        println!("Directory SFI: {sfi}");
    }
    print_objects(
        "Other directory data",
        &directory.unprocessed,
        mode,
        TagRegistry::global(),
        &TagContext::global(),
    );

    if directory.candidates.is_empty() {
        println!("No applications found via PSE/PPSE");
        return;
    }
    println!("Found {} application(s):\n", directory.candidates.len());
    for (i, app) in directory.by_priority().iter().enumerate() {
        println!("Application {}:", i + 1);
        println!("  AID: {}", app.aid_hex());
        if let Some(label) = &app.label {
            println!("  Label: {label}");
        }
        if let Some(name) = &app.preferred_name {
            println!("  Preferred Name: {name}");
        }
        if let Some(priority) = app.priority {
            println!("  Priority: {} (lower = higher priority)", priority & 0x0F);
        }
    }
}

fn print_application(report: &ApplicationReport, mode: FormatMode) {
    let app = &report.application;
    println!("\n=== {} ({}) ===\n", app.display_name(), app.aid_hex());

    match &report.status {
        ApplicationStatus::Completed => println!("Status: completed"),
        ApplicationStatus::Selected => println!("Status: selected"),
        ApplicationStatus::Skipped(err) => println!("Status: skipped ({err})"),
        ApplicationStatus::Aborted(err) => println!("Status: aborted ({err})"),
    }

    print_fields(app);

    if let Some(aip) = app.aip {
        let capabilities = aip.capabilities();
        println!(
            "AIP: {aip} ({})",
            if capabilities.is_empty() { "none".to_string() } else { capabilities.join(", ") }
        );
    }
    for entry in &app.afl {
        println!(
            "AFL: SFI {} records {}-{} ({} for offline authentication)",
            entry.sfi, entry.first_record, entry.last_record, entry.offline_auth_records
        );
    }

    let registry = TagRegistry::global();
    let context = app.tag_context();

    if !app.records.is_empty() {
        println!("\nRecords read: {}\n", app.records.len());
        for record in &app.records {
            println!("Record {} (SFI {}):", record.number, record.sfi);
            match mode {
                FormatMode::Raw => println!("  Data ({} bytes): {}", record.data.len(), hex::encode_upper(&record.data)),
                FormatMode::Human => print_record(&record.data, mode, registry, &context),
            }
        }
    }

    print_objects("Other known data objects", app.unprocessed(), mode, registry, &context);
    print_objects("Unknown data objects", app.unknown(), mode, registry, &context);
}

fn print_fields(app: &ApplicationCandidate) {
    let fields = [
        ("Priority", app.priority.map(|p| (p & 0x0F).to_string())),
        ("Language Preference", app.language_preference.clone()),
        ("Issuer Country", app.issuer_country.clone()),
        ("Issuer URL", app.issuer_url.clone()),
        ("IIN", app.iin.as_deref().map(hex::encode_upper)),
        ("Log Entry", app.log_entry.as_deref().map(hex::encode_upper)),
        ("PDOL", app.pdol.as_deref().map(hex::encode_upper)),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            println!("{name}: {value}");
        }
    }
}

fn print_record(data: &[u8], mode: FormatMode, registry: &TagRegistry, context: &TagContext<'_>) {
    match tlv::decode(data) {
        Ok(objects) => {
            for object in &objects {
                let children = object.children().unwrap_or_default();
                let items = if children.is_empty() { std::slice::from_ref(object) } else { &children[..] };
                for item in items {
                    print_object(item, mode, registry, context);
                }
            }
        }
        Err(_) => print!("{}", render_tlv(data, registry, context)),
    }
}

fn print_objects(title: &str, objects: &[Tlv], mode: FormatMode, registry: &TagRegistry, context: &TagContext<'_>) {
    if objects.is_empty() {
        return;
    }
    println!("\n{title}:");
    for object in objects {
        print_object(object, mode, registry, context);
    }
}

fn print_object(object: &Tlv, mode: FormatMode, registry: &TagRegistry, context: &TagContext<'_>) {
    let name = registry.lookup(context, object.tag()).name();
    println!(
        "  [{}] {}: {}",
        object.tag_hex(),
        name,
        format_value(object.tag(), object.value(), mode, registry, context)
    );
}
