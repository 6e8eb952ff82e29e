use lvr_trend::loader::{ingest_directory, ingest_root};
use lvr_trend::predict::{self, PredictionInput};
use lvr_trend::query::{self, FilterConditions, SearchForm};
use lvr_trend::reference::AreaUnit;
use lvr_trend::reports;
use lvr_trend::store::Store;
use lvr_trend::{CivilDate, LvrError, TradeSign, YearMonth};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const MAIN_HEADER: &str = "鄉鎮市區,交易標的,土地位置建物門牌,交易年月日,建物移轉總面積平方公尺,總價元,單價元平方公尺,編號";
const MAIN_ENGLISH: &str = "The villages and towns urban district,transaction sign,land sector position building sector house number plate,transaction year month and day,building shifting total area,total price NTD,the unit price (NTD / square meter),serial number";

fn write(dir: &Path, name: &str, lines: &[&str]) {
    let mut body = lines.join("\n");
    body.push('\n');
    fs::write(dir.join(name), body).unwrap();
}

fn write_main(dir: &Path, name: &str, rows: &[&str]) {
    let mut lines = vec![MAIN_HEADER, MAIN_ENGLISH];
    lines.extend_from_slice(rows);
    write(dir, name, &lines);
}

fn taipei_pair(dir: &Path) {
    write_main(
        dir,
        "a_lvr_land_a.csv",
        &[
            "大安區,房地(土地+建物),臺北市大安區和平東路一段1號,1110105,100.5,30000000,298507,A0001",
            "信義區,房地(土地+建物)+車位,臺北市信義區松仁路2號,1110215,80,24000000,300000,A0002",
        ],
    );
    write(
        dir,
        "a_lvr_land_a_build.csv",
        &[
            "編號,屋齡,建物移轉面積平方公尺",
            "serial number,building age,building shifting area",
            "A0001,5,100.5",
            "A0002,12,80",
        ],
    );
}

#[test]
fn main_file_joins_building_ages() {
    let dir = tempdir().unwrap();
    taipei_pair(dir.path());

    let (records, report) = ingest_directory(dir.path()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(report.files_read, 2);
    assert_eq!(report.parse_errors, 0);
    assert_eq!(report.ages_resolved, 2);

    let first = &records[0];
    assert_eq!(first.city_code, "A");
    assert_eq!(first.city_name, "臺北市");
    assert_eq!(first.code, "A0001");
    assert_eq!(first.age, 5);
    assert_eq!(first.town_code, "A02");
    assert_eq!(first.trade_sign, TradeSign::Property);
    assert_eq!(first.trade_date, CivilDate::from_compact(1110105));
    assert_eq!(first.price_total, 30_000_000);
    assert_eq!(first.price_unit, 298_507);
    assert!((first.total_area - 100.5).abs() < 1e-9);

    let second = &records[1];
    assert_eq!(second.code, "A0002");
    assert_eq!(second.age, 12);
    assert_eq!(second.city_code, "A");
    assert_eq!(second.trade_sign, TradeSign::PropertyParking);
}

#[test]
fn land_and_parking_details_become_undated_records() {
    let dir = tempdir().unwrap();
    taipei_pair(dir.path());
    write(
        dir.path(),
        "a_lvr_land_a_land.csv",
        &[
            "編號,土地位置,土地移轉面積平方公尺",
            "serial number,land position,land shifting area",
            "A0001,臺北市大安區和平段一小段,20.5",
        ],
    );
    write(
        dir.path(),
        "a_lvr_land_a_park.csv",
        &[
            "編號,車位類別,車位價格,車位面積平方公尺",
            "serial number,parking category,parking price,parking area",
            "A0002,坡道平面,2000000,12.5",
        ],
    );

    let (records, report) = ingest_directory(dir.path()).unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(report.files_read, 4);

    let land = records
        .iter()
        .find(|r| r.trade_sign == TradeSign::Land)
        .unwrap();
    assert_eq!(land.code, "A0001");
    assert_eq!(land.town_code, "A02");
    assert_eq!(land.town_name, "大安區");
    assert!(land.trade_date.is_none());

    let park = records
        .iter()
        .find(|r| r.trade_sign == TradeSign::Parking)
        .unwrap();
    assert_eq!(park.price_total, 2_000_000);
    assert!((park.total_area - 12.5).abs() < 1e-9);
    assert!(park.address.is_empty());

    // Undated detail rows never reach a month bucket.
    let monthly = reports::monthly_average(&records);
    assert_eq!(monthly.len(), 2);
}

#[test]
fn detail_files_without_their_main_file_are_skipped() {
    let dir = tempdir().unwrap();
    write(
        dir.path(),
        "b_lvr_land_a_land.csv",
        &["編號,土地位置,土地移轉面積平方公尺", "B0001,臺中市西屯區,10"],
    );
    write(
        dir.path(),
        "b_lvr_land_a_build.csv",
        &["編號,屋齡,建物移轉面積平方公尺", "B0001,3,10"],
    );
    write(dir.path(), "readme.txt", &["not an extract"]);

    let (records, report) = ingest_directory(dir.path()).unwrap();
    assert!(records.is_empty());
    assert_eq!(report.files_read, 0);
    assert_eq!(report.files_skipped, 2);
}

#[test]
fn bad_rows_are_counted_and_the_rest_kept() {
    let dir = tempdir().unwrap();
    write_main(
        dir.path(),
        "a_lvr_land_a.csv",
        &[
            "大安區,房地(土地+建物),臺北市大安區,not-a-date,10,100,10,A1",
            "大安區,房地(土地+建物),臺北市大安區,1110301,10,,abc,A2",
            "大安區,房地(土地+建物),臺北市大安區,21474835470101,10,100,10,A3",
            "大安區,房地(土地+建物),臺北市大安區,9999999999999999/01/01,10,100,10,A4",
        ],
    );
    let (records, report) = ingest_directory(dir.path()).unwrap();
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.parse_errors, 3);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].code, "A2");
    assert_eq!(records[0].price_total, 0);
    assert_eq!(records[0].price_unit, 0);
    assert_eq!(records[0].age, 0);
}

#[test]
fn root_walks_each_quarter_directory() {
    let root = tempdir().unwrap();
    let q1 = root.path().join("data0");
    let q2 = root.path().join("data1");
    fs::create_dir_all(&q1).unwrap();
    fs::create_dir_all(&q2).unwrap();
    taipei_pair(&q1);
    write_main(
        &q2,
        "a_lvr_land_a.csv",
        &["中山區,房地(土地+建物),臺北市中山區南京東路3號,1110320,50,15000000,300000,A0003"],
    );

    let (records, report) = ingest_root(root.path()).unwrap();
    assert_eq!(report.directories, 2);
    assert_eq!(records.len(), 3);
    assert_eq!(report.records, 3);
    // The second quarter has no building file, so its age stays unresolved.
    assert_eq!(records[2].code, "A0003");
    assert_eq!(records[2].age, 0);
}

#[test]
fn stored_records_feed_the_trend() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data0");
    fs::create_dir_all(&data).unwrap();
    write_main(
        &data,
        "a_lvr_land_a.csv",
        &[
            "大安區,房地(土地+建物),臺北市大安區一路1號,1110105,30,3000000,90000,A1",
            "大安區,房地(土地+建物),臺北市大安區一路2號,1110120,30,3300000,110000,A2",
            "大安區,房地(土地+建物),臺北市大安區一路3號,1110210,30,3300000,110000,A3",
            "信義區,房地(土地+建物),臺北市信義區二路4號,1110211,30,9000000,900000,A4",
        ],
    );
    let (records, _) = ingest_root(dir.path()).unwrap();
    assert_eq!(records.len(), 4);

    let store = Store::open(&dir.path().join("db/lvr.db"), "lvr_lnd").unwrap();
    assert_eq!(store.insert_records(&records).unwrap(), 4);

    let form = SearchForm {
        city: "A".into(),
        town: "A02".into(),
        start: Some(YearMonth::new(111, 1).unwrap()),
        end: Some(YearMonth::new(111, 12).unwrap()),
        ..Default::default()
    };
    let predicate = query::build(&form.to_conditions()).unwrap();
    let selected = store.query(&predicate).unwrap();
    assert_eq!(selected.len(), 3);

    let monthly = reports::monthly_average(&selected);
    assert_eq!(monthly[&11101], 100_000.0);
    assert_eq!(monthly[&11102], 110_000.0);

    let target = YearMonth::new(111, 4).unwrap();
    let price = predict::predict(&monthly, target).unwrap();
    assert!((price - 130_000.0).abs() < 1e-6);

    let estimate = predict::estimate(
        &monthly,
        &PredictionInput {
            target,
            area: 10.0,
            area_unit: AreaUnit::Ping,
        },
    )
    .unwrap();
    assert!((estimate.unit_price - 130_000.0 * 3.305785 / 10_000.0).abs() < 1e-9);
    assert!((estimate.total_price - estimate.unit_price * 10.0).abs() < 1e-9);
}

#[test]
fn one_month_of_data_cannot_be_projected() {
    let dir = tempdir().unwrap();
    taipei_pair(dir.path());
    let (records, _) = ingest_directory(dir.path()).unwrap();
    let only_january: Vec<_> = records
        .into_iter()
        .filter(|r| r.code == "A0001")
        .collect();
    let monthly = reports::monthly_average(&only_january);
    assert!(matches!(
        predict::predict(&monthly, YearMonth::new(112, 1).unwrap()),
        Err(LvrError::InsufficientData(1))
    ));
}

#[test]
fn malformed_month_bound_is_rejected_before_querying() {
    let conditions = FilterConditions {
        trade_date: (Some("111x1".into()), Some("11112".into())),
        ..Default::default()
    };
    assert!(matches!(
        query::build(&conditions),
        Err(LvrError::InvalidCondition(_))
    ));
}
