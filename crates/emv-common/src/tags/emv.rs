//! EMV Book 3 data elements shared by every payment application

use super::Tag;
use super::ValueKind::{Binary, Dol, Mixed, Numeric, Template, Text};

/// Global EMV tag table
pub static EMV_TAGS: &[Tag] = &[
    // Application selection
    Tag::new(&[0x42], Numeric, "Issuer Identification Number (IIN)", "Number that identifies the major industry and the card issuer"),
    Tag::new(&[0x4F], Binary, "Application Identifier (AID)", "Identifies the application as described in ISO/IEC 7816-5"),
    Tag::new(&[0x50], Text, "Application Label", "Mnemonic associated with the AID according to ISO/IEC 7816-5"),
    Tag::new(&[0x61], Template, "Application Template", "Contains one or more data objects relevant to an application directory entry"),
    Tag::new(&[0x6F], Template, "File Control Information (FCI) Template", "Set of file control parameters and file management data"),
    Tag::new(&[0x73], Template, "Directory Discretionary Template", "Issuer discretionary part of the directory"),
    Tag::new(&[0x84], Binary, "Dedicated File (DF) Name", "Identifies the name of the DF as described in ISO/IEC 7816-4"),
    Tag::new(&[0x87], Binary, "Application Priority Indicator", "Priority of an application within a directory"),
    Tag::new(&[0x88], Binary, "Short File Identifier (SFI)", "Identifies the SFI used in commands related to an elementary file"),
    Tag::new(&[0x9D], Binary, "Directory Definition File (DDF) Name", "Identifies the name of a DF associated with a directory"),
    Tag::new(&[0xA5], Template, "FCI Proprietary Template", "Proprietary data elements of the FCI"),
    Tag::new(&[0xBF, 0x0C], Template, "FCI Issuer Discretionary Data", "Issuer discretionary part of the FCI"),
    Tag::new(&[0x5F, 0x2D], Text, "Language Preference", "1-4 languages stored in order of preference"),
    Tag::new(&[0x5F, 0x50], Text, "Issuer URL", "Location of the issuer's library server on the internet"),
    Tag::new(&[0x5F, 0x53], Binary, "International Bank Account Number (IBAN)", "Uniquely identifies the account of a customer at a financial institution"),
    Tag::new(&[0x5F, 0x54], Text, "Bank Identifier Code (BIC)", "Uniquely identifies a bank as defined in ISO 9362"),
    Tag::new(&[0x5F, 0x55], Text, "Issuer Country Code (alpha2)", "Country of the issuer as defined in ISO 3166, two letters"),
    Tag::new(&[0x5F, 0x56], Text, "Issuer Country Code (alpha3)", "Country of the issuer as defined in ISO 3166, three letters"),
    Tag::new(&[0x9F, 0x11], Numeric, "Issuer Code Table Index", "ISO/IEC 8859 code table for displaying the Application Preferred Name"),
    Tag::new(&[0x9F, 0x12], Text, "Application Preferred Name", "Preferred mnemonic associated with the AID"),
    Tag::new(&[0x9F, 0x0C], Numeric, "Issuer Identification Number Extended (IINE)", "Eight digit issuer identification number"),
    Tag::new(&[0x9F, 0x4D], Binary, "Log Entry", "SFI of the transaction log file and number of records"),
    Tag::new(&[0x9F, 0x4F], Dol, "Log Format", "List of data objects in each transaction log record"),
    // Card data
    Tag::new(&[0x56], Binary, "Track 1 Data", "Track 1 data read from the card"),
    Tag::new(&[0x57], Binary, "Track 2 Equivalent Data", "Contents of track 2 of the magnetic stripe"),
    Tag::new(&[0x5A], Numeric, "Application PAN", "Valid cardholder account number"),
    Tag::new(&[0x5F, 0x20], Text, "Cardholder Name", "Name of the cardholder as defined in ISO/IEC 7813"),
    Tag::new(&[0x5F, 0x24], Numeric, "Application Expiration Date", "Date after which the application expires (YYMMDD)"),
    Tag::new(&[0x5F, 0x25], Numeric, "Application Effective Date", "Date from which the application may be used (YYMMDD)"),
    Tag::new(&[0x5F, 0x28], Numeric, "Issuer Country Code", "Country of the issuer according to ISO 3166"),
    Tag::new(&[0x5F, 0x30], Numeric, "Service Code", "Service code as defined in ISO/IEC 7813"),
    Tag::new(&[0x5F, 0x34], Numeric, "Application PAN Sequence Number", "Distinguishes applications with the same PAN"),
    Tag::new(&[0x9F, 0x05], Binary, "Application Discretionary Data", "Issuer or payment system specified data"),
    Tag::new(&[0x9F, 0x07], Binary, "Application Usage Control", "Issuer's restrictions on the use of the application"),
    Tag::new(&[0x9F, 0x08], Binary, "Application Version Number (Card)", "Version number assigned by the payment system for the application"),
    Tag::new(&[0x9F, 0x0B], Text, "Cardholder Name Extended", "Cardholder name longer than 26 characters"),
    Tag::new(&[0x9F, 0x0D], Binary, "Issuer Action Code - Default", "Conditions that cause a transaction to be rejected if it might have been approved online"),
    Tag::new(&[0x9F, 0x0E], Binary, "Issuer Action Code - Denial", "Conditions that cause the denial of a transaction without attempting to go online"),
    Tag::new(&[0x9F, 0x0F], Binary, "Issuer Action Code - Online", "Conditions that cause a transaction to be transmitted online"),
    Tag::new(&[0x9F, 0x10], Binary, "Issuer Application Data", "Proprietary application data for transmission to the issuer"),
    Tag::new(&[0x9F, 0x13], Binary, "Last Online ATC Register", "ATC value of the last transaction that went online"),
    Tag::new(&[0x9F, 0x14], Binary, "Lower Consecutive Offline Limit", "Issuer-specified preference for offline transactions"),
    Tag::new(&[0x9F, 0x17], Binary, "PIN Try Counter", "Number of PIN tries remaining"),
    Tag::new(&[0x9F, 0x19], Binary, "Token Requestor ID", "Uniquely identifies the pairing of token requestor with the token domain"),
    Tag::new(&[0x9F, 0x1F], Text, "Track 1 Discretionary Data", "Discretionary part of track 1"),
    Tag::new(&[0x9F, 0x20], Numeric, "Track 2 Discretionary Data", "Discretionary part of track 2"),
    Tag::new(&[0x9F, 0x23], Binary, "Upper Consecutive Offline Limit", "Issuer-specified preference for offline transactions"),
    Tag::new(&[0x9F, 0x24], Text, "Payment Account Reference (PAR)", "Non-financial reference assigned to each unique PAN"),
    Tag::new(&[0x9F, 0x25], Numeric, "Last 4 Digits of PAN", "Trailing digits of the PAN the token stands for"),
    Tag::new(&[0x9F, 0x36], Binary, "Application Transaction Counter (ATC)", "Counter maintained by the application in the card"),
    Tag::new(&[0x9F, 0x3B], Numeric, "Application Reference Currency", "Up to four alternative currencies for the application"),
    Tag::new(&[0x9F, 0x42], Numeric, "Application Currency Code", "Currency in which the account is managed according to ISO 4217"),
    Tag::new(&[0x9F, 0x43], Numeric, "Application Reference Currency Exponent", "Decimal point positions for the reference currencies"),
    Tag::new(&[0x9F, 0x44], Numeric, "Application Currency Exponent", "Decimal point position from the right of the amount"),
    // Processing options and records
    Tag::new(&[0x70], Template, "READ RECORD Response Message Template", "Template containing the data objects returned by READ RECORD"),
    Tag::new(&[0x77], Template, "Response Message Template Format 2", "Tag-delimited response message template"),
    Tag::new(&[0x80], Binary, "Response Message Template Format 1", "Undelimited response message template"),
    Tag::new(&[0x82], Binary, "Application Interchange Profile", "Capabilities of the card to support specific functions in the application"),
    Tag::new(&[0x83], Binary, "Command Template", "Identifies the data field of a command message"),
    Tag::new(&[0x94], Binary, "Application File Locator (AFL)", "Files and records to be read for the application"),
    Tag::new(&[0x9F, 0x38], Dol, "Processing Options Data Object List (PDOL)", "Terminal data objects requested by the card for GET PROCESSING OPTIONS"),
    // Card risk management and authentication
    Tag::new(&[0x8C], Dol, "Card Risk Management Data Object List 1 (CDOL1)", "Data objects to be passed with the first GENERATE AC"),
    Tag::new(&[0x8D], Dol, "Card Risk Management Data Object List 2 (CDOL2)", "Data objects to be passed with the second GENERATE AC"),
    Tag::new(&[0x8E], Binary, "Cardholder Verification Method (CVM) List", "Methods of verifying the cardholder supported by the application"),
    Tag::new(&[0x8F], Binary, "Certification Authority Public Key Index", "Identifies the CA public key in conjunction with the RID"),
    Tag::new(&[0x90], Binary, "Issuer Public Key Certificate", "Issuer public key certified by a certification authority"),
    Tag::new(&[0x92], Binary, "Issuer Public Key Remainder", "Remaining digits of the issuer public key modulus"),
    Tag::new(&[0x93], Binary, "Signed Static Application Data", "Digital signature on critical application parameters for SDA"),
    Tag::new(&[0x97], Dol, "Transaction Certificate Data Object List (TDOL)", "Data objects used to generate the TC hash value"),
    Tag::new(&[0x9F, 0x2D], Binary, "ICC PIN Encipherment Public Key Certificate", "ICC PIN encipherment public key certified by the issuer"),
    Tag::new(&[0x9F, 0x2E], Binary, "ICC PIN Encipherment Public Key Exponent", "Exponent of the ICC PIN encipherment public key"),
    Tag::new(&[0x9F, 0x2F], Binary, "ICC PIN Encipherment Public Key Remainder", "Remaining digits of the ICC PIN encipherment public key modulus"),
    Tag::new(&[0x9F, 0x32], Binary, "Issuer Public Key Exponent", "Exponent of the issuer public key"),
    Tag::new(&[0x9F, 0x46], Binary, "ICC Public Key Certificate", "ICC public key certified by the issuer"),
    Tag::new(&[0x9F, 0x47], Binary, "ICC Public Key Exponent", "Exponent of the ICC public key"),
    Tag::new(&[0x9F, 0x48], Binary, "ICC Public Key Remainder", "Remaining digits of the ICC public key modulus"),
    Tag::new(&[0x9F, 0x49], Dol, "Dynamic Data Authentication Data Object List (DDOL)", "Data objects to be passed with INTERNAL AUTHENTICATE"),
    Tag::new(&[0x9F, 0x4A], Binary, "Static Data Authentication Tag List", "Tags of primitive objects whose values are included in static authentication"),
    Tag::new(&[0x9F, 0x4B], Binary, "Signed Dynamic Application Data", "Digital signature generated by the card for dynamic authentication"),
    Tag::new(&[0x9F, 0x4C], Binary, "ICC Dynamic Number", "Time-variant number generated by the card"),
    Tag::new(&[0x9F, 0x26], Binary, "Application Cryptogram", "Cryptogram returned by the card in response to GENERATE AC"),
    Tag::new(&[0x9F, 0x27], Binary, "Cryptogram Information Data", "Type of cryptogram and the actions to be performed by the terminal"),
    Tag::new(&[0x9F, 0x45], Binary, "Data Authentication Code", "Issuer-assigned value retained by the terminal during SDA"),
    // Issuer scripts and online processing
    Tag::new(&[0x71], Template, "Issuer Script Template 1", "Issuer script commands delivered before the final GENERATE AC"),
    Tag::new(&[0x72], Template, "Issuer Script Template 2", "Issuer script commands delivered after the final GENERATE AC"),
    Tag::new(&[0x86], Binary, "Issuer Script Command", "Command for transmission to the card"),
    Tag::new(&[0x89], Mixed, "Authorisation Code", "Value generated by the authorisation authority for an approved transaction"),
    Tag::new(&[0x8A], Text, "Authorisation Response Code", "Disposition of a message"),
    Tag::new(&[0x91], Binary, "Issuer Authentication Data", "Data sent to the card for online issuer authentication"),
    Tag::new(&[0x9F, 0x18], Binary, "Issuer Script Identifier", "Identification of the issuer script"),
    // Terminal data
    Tag::new(&[0x81], Binary, "Amount, Authorised (Binary)", "Authorised amount of the transaction"),
    Tag::new(&[0x95], Binary, "Terminal Verification Results", "Status of the different functions as seen from the terminal"),
    Tag::new(&[0x98], Binary, "Transaction Certificate (TC) Hash Value", "Result of a hash over the TDOL data"),
    Tag::new(&[0x99], Binary, "Transaction Personal Identification Number (PIN) Data", "Data entered by the cardholder for PIN verification"),
    Tag::new(&[0x9A], Numeric, "Transaction Date", "Local date the transaction was authorised (YYMMDD)"),
    Tag::new(&[0x9B], Binary, "Transaction Status Information", "Functions performed in a transaction"),
    Tag::new(&[0x9C], Numeric, "Transaction Type", "Type of financial transaction, first two digits of the ISO 8583 processing code"),
    Tag::new(&[0x5F, 0x2A], Numeric, "Transaction Currency Code", "Currency code of the transaction according to ISO 4217"),
    Tag::new(&[0x5F, 0x36], Numeric, "Transaction Currency Exponent", "Decimal point position from the right of the transaction amount"),
    Tag::new(&[0x9F, 0x01], Numeric, "Acquirer Identifier", "Uniquely identifies the acquirer within each payment system"),
    Tag::new(&[0x9F, 0x02], Numeric, "Amount, Authorised (Numeric)", "Authorised amount of the transaction"),
    Tag::new(&[0x9F, 0x03], Numeric, "Amount, Other (Numeric)", "Secondary amount associated with the transaction"),
    Tag::new(&[0x9F, 0x04], Binary, "Amount, Other (Binary)", "Secondary amount associated with the transaction"),
    Tag::new(&[0x9F, 0x06], Binary, "Application Identifier (AID) - Terminal", "Identifies the application as described in ISO/IEC 7816-5"),
    Tag::new(&[0x9F, 0x09], Binary, "Application Version Number (Terminal)", "Version number assigned by the payment system for the application"),
    Tag::new(&[0x9F, 0x15], Numeric, "Merchant Category Code", "Classifies the type of business being done by the merchant"),
    Tag::new(&[0x9F, 0x16], Text, "Merchant Identifier", "Uniquely identifies a merchant"),
    Tag::new(&[0x9F, 0x1A], Numeric, "Terminal Country Code", "Country of the terminal according to ISO 3166"),
    Tag::new(&[0x9F, 0x1B], Binary, "Terminal Floor Limit", "Floor limit in the terminal"),
    Tag::new(&[0x9F, 0x1C], Text, "Terminal Identification", "Designates the unique location of a terminal at a merchant"),
    Tag::new(&[0x9F, 0x1D], Binary, "Terminal Risk Management Data", "Application-specific value used by the card for risk management"),
    Tag::new(&[0x9F, 0x1E], Text, "Interface Device (IFD) Serial Number", "Unique serial number assigned to the IFD by the manufacturer"),
    Tag::new(&[0x9F, 0x21], Numeric, "Transaction Time", "Local time the transaction was authorised (HHMMSS)"),
    Tag::new(&[0x9F, 0x22], Binary, "Certification Authority Public Key Index (Terminal)", "Identifies the CA public key in conjunction with the RID"),
    Tag::new(&[0x9F, 0x33], Binary, "Terminal Capabilities", "Card data input, CVM and security capabilities of the terminal"),
    Tag::new(&[0x9F, 0x34], Binary, "Cardholder Verification Method (CVM) Results", "Results of the last CVM performed"),
    Tag::new(&[0x9F, 0x35], Numeric, "Terminal Type", "Environment of the terminal, its communications capability and operational control"),
    Tag::new(&[0x9F, 0x37], Binary, "Unpredictable Number", "Value providing variability and uniqueness to the cryptogram"),
    Tag::new(&[0x9F, 0x39], Numeric, "Point-of-Service (POS) Entry Mode", "How the PAN was entered"),
    Tag::new(&[0x9F, 0x3A], Binary, "Amount, Reference Currency", "Authorised amount expressed in the reference currency"),
    Tag::new(&[0x9F, 0x3C], Numeric, "Transaction Reference Currency Code", "Reference currency code of the transaction"),
    Tag::new(&[0x9F, 0x3D], Numeric, "Transaction Reference Currency Exponent", "Decimal point position of the reference currency amount"),
    Tag::new(&[0x9F, 0x40], Binary, "Additional Terminal Capabilities", "Data input and output capabilities of the terminal"),
    Tag::new(&[0x9F, 0x41], Numeric, "Transaction Sequence Counter", "Counter maintained by the terminal, incremented per transaction"),
    Tag::new(&[0x9F, 0x4E], Text, "Merchant Name and Location", "Name and location of the merchant"),
    Tag::new(&[0x9F, 0x66], Binary, "Terminal Transaction Qualifiers (TTQ)", "Contactless capabilities, requirements and preferences of the reader"),
];
