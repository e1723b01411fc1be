//! Parsers for the card responses of each session phase
//!
//! Every parser fills in an [`ApplicationCandidate`] or [`Directory`] and
//! hands objects it does not interpret to [`ApplicationCandidate::absorb`].

use emv_common::tags::ids;
use emv_common::tlv::{self, Tlv};
use emv_common::TagRegistry;
use tracing::debug;

use crate::application::{Aip, ApplicationCandidate, Directory, parse_afl};
use crate::error::ParseError;

fn text(value: &[u8]) -> String {
    String::from_utf8_lossy(value).trim().to_string()
}

fn first_byte(value: &[u8]) -> Option<u8> {
    value.first().copied()
}

fn fci_template(data: &[u8]) -> Result<Tlv, ParseError> {
    tlv::decode(data)?
        .into_iter()
        .find(|object| object.tag() == ids::FCI_TEMPLATE)
        .ok_or(ParseError::Missing("FCI template"))
}

/// Parse the FCI returned by SELECT of the PPSE or PSE
pub fn parse_directory_fci(data: &[u8], registry: &TagRegistry) -> Result<Directory, ParseError> {
    let fci = fci_template(data)?;
    let mut directory = Directory::default();

    for child in fci.children()? {
        match child.tag() {
            ids::DF_NAME => directory.name = child.into_value(),
            ids::FCI_PROPRIETARY_TEMPLATE => {
                for item in child.children()? {
                    match item.tag() {
                        ids::SFI => directory.sfi = first_byte(item.value()),
                        ids::LANGUAGE_PREFERENCE => directory.language_preference = Some(text(item.value())),
                        ids::ISSUER_CODE_TABLE_INDEX => {
                            directory.issuer_code_table_index = first_byte(item.value());
                        }
                        ids::FCI_ISSUER_DISCRETIONARY_DATA => {
                            for entry in item.children()? {
                                if entry.tag() == ids::APPLICATION_TEMPLATE {
                                    directory.candidates.push(parse_application_template(&entry, registry)?);
                                } else {
                                    keep_unprocessed(&mut directory, entry);
                                }
                            }
                        }
                        _ => keep_unprocessed(&mut directory, item),
                    }
                }
            }
            _ => keep_unprocessed(&mut directory, child),
        }
    }

    Ok(directory)
}

fn keep_unprocessed(directory: &mut Directory, object: Tlv) {
    debug!(tag = %object.tag_hex(), length = object.value().len(), "Unprocessed directory object");
    directory.unprocessed.push(object);
}

/// Parse one Application Template (`61`) from a directory
pub fn parse_application_template(
    template: &Tlv,
    registry: &TagRegistry,
) -> Result<ApplicationCandidate, ParseError> {
    let children = template.children()?;
    let aid = tlv::find(&children, ids::APPLICATION_IDENTIFIER)
        .ok_or(ParseError::Missing("Application Identifier"))?;
    let mut candidate = ApplicationCandidate::new(aid.value());

    for child in children {
        match child.tag() {
            ids::APPLICATION_IDENTIFIER => {}
            ids::APPLICATION_LABEL => candidate.label = Some(text(child.value())),
            ids::APPLICATION_PREFERRED_NAME => candidate.preferred_name = Some(text(child.value())),
            ids::APPLICATION_PRIORITY_INDICATOR => candidate.priority = first_byte(child.value()),
            _ => candidate.absorb(child, registry),
        }
    }

    Ok(candidate)
}

/// Parse a record of the contact PSE directory file
pub fn parse_directory_record(
    data: &[u8],
    registry: &TagRegistry,
) -> Result<Vec<ApplicationCandidate>, ParseError> {
    let mut candidates = Vec::new();
    for object in tlv::decode(data)? {
        if object.tag() != ids::RECORD_TEMPLATE {
            continue;
        }
        for entry in object.children()? {
            if entry.tag() == ids::APPLICATION_TEMPLATE {
                candidates.push(parse_application_template(&entry, registry)?);
            }
        }
    }
    Ok(candidates)
}

/// Parse the FCI returned by SELECT of an application
///
/// Failures inside the FCI Issuer Discretionary Data abort only that
/// sub-template; they come back as `Ok(Some(error))`.
pub fn parse_application_fci(
    data: &[u8],
    application: &mut ApplicationCandidate,
    registry: &TagRegistry,
) -> Result<Option<ParseError>, ParseError> {
    let fci = fci_template(data)?;
    let mut discretionary_error = None;

    for child in fci.children()? {
        match child.tag() {
            ids::DF_NAME => {
                if application.aid.is_empty() {
                    application.aid = child.into_value();
                }
            }
            ids::FCI_PROPRIETARY_TEMPLATE => {
                for item in child.children()? {
                    match item.tag() {
                        ids::APPLICATION_LABEL => application.label = Some(text(item.value())),
                        ids::APPLICATION_PREFERRED_NAME => application.preferred_name = Some(text(item.value())),
                        ids::APPLICATION_PRIORITY_INDICATOR => application.priority = first_byte(item.value()),
                        ids::PDOL => application.pdol = Some(item.into_value()),
                        ids::LANGUAGE_PREFERENCE => application.language_preference = Some(text(item.value())),
                        ids::ISSUER_CODE_TABLE_INDEX => {
                            application.issuer_code_table_index = first_byte(item.value());
                        }
                        ids::FCI_ISSUER_DISCRETIONARY_DATA => {
                            if let Err(err) = parse_issuer_discretionary(&item, application, registry) {
                                discretionary_error = Some(err);
                            }
                        }
                        _ => application.absorb(item, registry),
                    }
                }
            }
            _ => application.absorb(child, registry),
        }
    }

    Ok(discretionary_error)
}

fn parse_issuer_discretionary(
    template: &Tlv,
    application: &mut ApplicationCandidate,
    registry: &TagRegistry,
) -> Result<(), ParseError> {
    for item in template.children()? {
        match item.tag() {
            ids::LOG_ENTRY => application.log_entry = Some(item.into_value()),
            ids::ISSUER_URL => application.issuer_url = Some(text(item.value())),
            ids::ISSUER_IDENTIFICATION_NUMBER => application.iin = Some(item.into_value()),
            ids::ISSUER_COUNTRY_CODE_ALPHA3 => application.issuer_country = Some(text(item.value())),
            ids::ISSUER_COUNTRY_CODE_ALPHA2 => {
                if application.issuer_country.is_none() {
                    application.issuer_country = Some(text(item.value()));
                }
            }
            _ => application.absorb(item, registry),
        }
    }
    Ok(())
}

/// Parse a GET PROCESSING OPTIONS response
///
/// Format 1 (`80`) carries the AIP followed by the AFL. Format 2 (`77`) is a
/// template holding `82` and `94` among other objects.
pub fn parse_processing_options(
    data: &[u8],
    application: &mut ApplicationCandidate,
    registry: &TagRegistry,
) -> Result<(), ParseError> {
    let objects = tlv::decode(data)?;
    let template = objects.first().ok_or(ParseError::Missing("response message template"))?;

    match template.tag() {
        ids::RESPONSE_MESSAGE_TEMPLATE_FORMAT_1 => {
            let value = template.value();
            if value.is_empty() {
                return Ok(());
            }
            let (aip, afl) = value.split_at(value.len().min(2));
            application.aip = Some(Aip::from_bytes(aip)?);
            application.afl = parse_afl(afl)?;
        }
        ids::RESPONSE_MESSAGE_TEMPLATE_FORMAT_2 => {
            for child in template.children()? {
                match child.tag() {
                    ids::AIP => application.aip = Some(Aip::from_bytes(child.value())?),
                    ids::AFL => application.afl = parse_afl(child.value())?,
                    _ => application.absorb(child, registry),
                }
            }
        }
        other => return Err(ParseError::UnexpectedTemplate(hex::encode_upper(other))),
    }

    Ok(())
}

/// Parse a record read from an application elementary file
pub fn parse_record(
    data: &[u8],
    application: &mut ApplicationCandidate,
    registry: &TagRegistry,
) -> Result<(), ParseError> {
    for object in tlv::decode(data)? {
        if object.tag() == ids::RECORD_TEMPLATE {
            for child in object.children()? {
                application.absorb(child, registry);
            }
        } else {
            application.absorb(object, registry);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use emv_common::TlvError;

    fn bytes(hex: &str) -> Vec<u8> {
        hex::decode(hex).unwrap()
    }

    fn registry() -> &'static TagRegistry {
        TagRegistry::global()
    }

    #[test]
    fn test_ppse_directory() {
        // 6F [84 2PAY.SYS.DDF01] [A5 [BF0C [61 [4F A0000000031010] [50 VISA] [87 01]]]]
        let data = bytes(concat!(
            "6F29",
            "840E325041592E5359532E4444463031",
            "A517BF0C14",
            "61124F07A0000000031010",
            "500456495341",
            "870101",
        ));
        let directory = parse_directory_fci(&data, registry()).unwrap();
        assert_eq!(directory.name, b"2PAY.SYS.DDF01");
        assert_eq!(directory.candidates.len(), 1);
        let visa = &directory.candidates[0];
        assert_eq!(visa.aid, bytes("A0000000031010"));
        assert_eq!(visa.label.as_deref(), Some("VISA"));
        assert_eq!(visa.priority, Some(1));
    }

    #[test]
    fn test_directory_keeps_unrecognised_objects() {
        // 6F [84 2PAY.SYS.DDF01] [A5 [9F4D 0B0A] [BF0C [61 [4F A0000000041010]] [9F0A 0001]]] [DF01 7A]
        let data = bytes(concat!(
            "6F2E",
            "840E325041592E5359532E4444463031",
            "A5189F4D020B0A",
            "BF0C10",
            "61094F07A0000000041010",
            "9F0A020001",
            "DF01017A",
        ));
        let directory = parse_directory_fci(&data, registry()).unwrap();
        assert_eq!(directory.candidates.len(), 1);
        assert_eq!(directory.candidates[0].aid, bytes("A0000000041010"));
        let tags: Vec<_> = directory.unprocessed.iter().map(Tlv::tag_hex).collect();
        assert_eq!(tags, vec!["9F4D", "9F0A", "DF01"]);
        assert_eq!(directory.unprocessed[1].value(), &[0x00, 0x01]);
    }

    #[test]
    fn test_directory_without_fci() {
        assert_eq!(
            parse_directory_fci(&bytes("8400"), registry()),
            Err(ParseError::Missing("FCI template"))
        );
    }

    #[test]
    fn test_application_template_requires_aid() {
        let template = Tlv::new(vec![0x61], bytes("500456495341"));
        assert_eq!(
            parse_application_template(&template, registry()),
            Err(ParseError::Missing("Application Identifier"))
        );
    }

    #[test]
    fn test_contact_directory_record() {
        // 70 [61 [4F A0000000041010] [50 MC]]
        let data = bytes("700F610D4F07A000000004101050024D43");
        let candidates = parse_directory_record(&data, registry()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].label.as_deref(), Some("MC"));
    }

    #[test]
    fn test_application_fci() {
        // 6F [84 A0000000031010] [A5 [50 VISA] [9F38 9F6604] [BF0C [5F56 GBR] [42 412345] [DF7F 01]]]
        let data = bytes(concat!(
            "6F29",
            "8407A0000000031010",
            "A51E",
            "500456495341",
            "9F38039F6604",
            "BF0C0F5F56034742524203412345DF7F0101",
        ));
        let mut app = ApplicationCandidate::new(bytes("A0000000031010"));
        let warning = parse_application_fci(&data, &mut app, registry()).unwrap();

        assert_eq!(warning, None);
        assert_eq!(app.label.as_deref(), Some("VISA"));
        assert_eq!(app.pdol, Some(bytes("9F6604")));
        assert_eq!(app.issuer_country.as_deref(), Some("GBR"));
        assert_eq!(app.iin, Some(bytes("412345")));
        assert_eq!(app.unknown().len(), 1);
    }

    #[test]
    fn test_malformed_discretionary_data_is_contained() {
        // 9F4D inside BF0C claims more bytes than the template holds
        let data = bytes("6F0EA50C500456495341BF0C039F4D05");
        let mut app = ApplicationCandidate::new(bytes("A0000000031010"));
        let warning = parse_application_fci(&data, &mut app, registry()).unwrap();

        assert!(matches!(warning, Some(ParseError::Tlv(_))));
        assert_eq!(app.label.as_deref(), Some("VISA"));
    }

    #[test]
    fn test_gpo_format_1() {
        let mut app = ApplicationCandidate::new(bytes("A0000000031010"));
        parse_processing_options(&bytes("8006820001020301"), &mut app, registry()).unwrap();
        assert_eq!(app.aip, Some(Aip([0x82, 0x00])));
        assert_eq!(app.afl.len(), 1);
        assert_eq!(app.afl[0].sfi, 0);
        assert_eq!(app.afl[0].first_record, 2);
        assert_eq!(app.afl[0].last_record, 3);
        assert_eq!(app.afl[0].offline_auth_records, 1);
    }

    #[test]
    fn test_gpo_format_2() {
        // 77 [82 1980] [94 08010100] [9F36 0001] [9F42 0978]
        let data = bytes(concat!("7714", "82021980", "940408010100", "9F36020001", "9F42020978"));
        let mut app = ApplicationCandidate::new(bytes("A0000000041010"));
        parse_processing_options(&data, &mut app, registry()).unwrap();
        assert_eq!(app.aip, Some(Aip([0x19, 0x80])));
        assert_eq!(app.afl[0].sfi, 1);
        assert_eq!(app.currency_code, Some([0x09, 0x78]));
        assert_eq!(app.unprocessed().len(), 1);
    }

    #[test]
    fn test_gpo_unexpected_template() {
        let mut app = ApplicationCandidate::new(bytes("A0000000031010"));
        assert_eq!(
            parse_processing_options(&bytes("6F00"), &mut app, registry()),
            Err(ParseError::UnexpectedTemplate("6F".into()))
        );
    }

    #[test]
    fn test_gpo_bad_afl_rejected() {
        let mut app = ApplicationCandidate::new(bytes("A0000000031010"));
        assert_eq!(
            parse_processing_options(&bytes("80058200080101"), &mut app, registry()),
            Err(ParseError::AflLength(3))
        );
        assert!(matches!(
            parse_processing_options(&bytes("800582000801"), &mut app, registry()),
            Err(ParseError::Tlv(TlvError::ValueOverrun { .. }))
        ));
    }

    #[test]
    fn test_record() {
        // 70 [5F28 0826] [5A 4761739001010010]
        let data = bytes("700F5F280208265A084761739001010010");
        let mut app = ApplicationCandidate::new(bytes("A0000000031010"));
        parse_record(&data, &mut app, registry()).unwrap();
        assert_eq!(app.country_code, Some([0x08, 0x26]));
        assert_eq!(app.unprocessed().len(), 1);
    }
}
