use super::*;

#[test]
fn decodes_image_data_urls() {
    assert_eq!(decode_data_url("data:image/png;base64,AQID").unwrap(), vec![1, 2, 3]);
    assert_eq!(decode_data_url("data:image/jpeg;base64,AQID").unwrap(), vec![1, 2, 3]);
}

#[test]
fn bare_base64_and_whitespace_are_accepted() {
    assert_eq!(decode_data_url("AQID").unwrap(), vec![1, 2, 3]);
    assert_eq!(decode_data_url("  AQ\nID\r\n").unwrap(), vec![1, 2, 3]);
}

#[test]
fn rejects_malformed_urls() {
    for bad in [
        "",
        "data:image/png;base64,",
        "data:image/png;base64",
        "data:image/png,AQID",
        "data:text/plain;base64,AQID",
        "data:image/png;base64,!!!",
    ] {
        let err = decode_data_url(bad).unwrap_err();
        assert!(matches!(err, PhotoframeError::BadInput(_)), "{bad:?}");
    }
}

#[test]
fn encode_produces_decodable_url() {
    let url = encode_data_url("image/jpeg", &[0xff, 0xd8, 0xff]);
    assert!(url.starts_with("data:image/jpeg;base64,"));
    assert_eq!(decode_data_url(&url).unwrap(), vec![0xff, 0xd8, 0xff]);
}
