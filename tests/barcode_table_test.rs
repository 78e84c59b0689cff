use lot_console::parse_item_id;
use test_case::test_case;

#[test_case("TSK123-ITM456" => Some("ITM456".to_string()); "task then item")]
#[test_case("ITM456-TSK123" => Some("ITM456".to_string()); "item then task")]
#[test_case("tsk1-itm77" => Some("ITM77".to_string()); "lowercase compound")]
#[test_case("123-456" => Some("ITM456".to_string()); "numeric compound takes last part")]
#[test_case("A-B-C9D12" => Some("ITM9".to_string()); "first digit run of last part")]
#[test_case(" TSK1 - ITM8 " => Some("ITM8".to_string()); "padded parts")]
#[test_case("ITM789" => Some("ITM789".to_string()); "bare item id")]
#[test_case("label:ITM0042;v2" => Some("ITM0042".to_string()); "embedded item id")]
#[test_case("789" => Some("ITM789".to_string()); "digits only")]
#[test_case("  00012  " => Some("ITM00012".to_string()); "digits keep leading zeros")]
#[test_case("garbage!!" => None; "no digits")]
#[test_case("12a" => None; "mixed without dash")]
#[test_case("abc-" => None; "empty last part")]
#[test_case("" => None; "empty")]
fn parses_scanned_text(raw: &str) -> Option<String> {
    parse_item_id(raw)
}
