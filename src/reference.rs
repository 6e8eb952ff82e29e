// Static lookup tables published alongside the open data: city codes, the
// towns of each city, and the age brackets offered by the search form.
//
// The tables are read-only; lookups go through a lazily built index so that
// callers never scan `TOWNS` linearly for the city itself.
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Square meters in one ping, the customary areal unit for listings.
pub const PING_IN_SQM: f64 = 3.305785;

/// Prices on the search form and in estimates are quoted in units of 10,000.
pub const CURRENCY_SCALE: f64 = 10_000.0;

/// Unit of the area figures a user types in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaUnit {
    SquareMeter,
    #[default]
    Ping,
}

impl AreaUnit {
    pub fn to_sqm(self, value: f64) -> f64 {
        match self {
            Self::SquareMeter => value,
            Self::Ping => value * PING_IN_SQM,
        }
    }

    pub fn to_ping(self, value: f64) -> f64 {
        match self {
            Self::SquareMeter => value / PING_IN_SQM,
            Self::Ping => value,
        }
    }
}

/// Unit of the price figures a user types in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriceScale {
    #[default]
    TenThousand,
    One,
}

impl PriceScale {
    pub fn to_currency(self, value: f64) -> f64 {
        match self {
            Self::TenThousand => value * CURRENCY_SCALE,
            Self::One => value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Town {
    pub code: &'static str,
    pub title: &'static str,
}

impl Town {
    pub const fn new(code: &'static str, title: &'static str) -> Self {
        Self { code, title }
    }
}

static CITY_INDEX: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| CITIES.iter().copied().collect());

static TOWN_INDEX: Lazy<HashMap<&'static str, &'static [Town]>> =
    Lazy::new(|| TOWNS.iter().copied().collect());

pub fn city_name(city_code: &str) -> Option<&'static str> {
    CITY_INDEX.get(city_code).copied()
}

/// Towns of a city in table order; empty for an unknown city.
pub fn towns(city_code: &str) -> &'static [Town] {
    TOWN_INDEX.get(city_code).copied().unwrap_or(&[])
}

/// First town (in table order) whose title occurs inside `address`.
///
/// Titles can nest, so the order of `TOWNS` is the tie-break.
pub fn town_in_address(city_code: &str, address: &str) -> Option<&'static Town> {
    if address.is_empty() {
        return None;
    }
    towns(city_code).iter().find(|t| address.contains(t.title))
}

pub fn town_by_title(city_code: &str, title: &str) -> Option<&'static Town> {
    towns(city_code).iter().find(|t| t.title == title)
}

pub fn is_town_of(city_code: &str, town_code: &str) -> bool {
    towns(city_code).iter().any(|t| t.code == town_code)
}

/// Building-age brackets of the search form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBracket {
    UpTo5,
    From5To10,
    From10To20,
    From20To30,
    From30To40,
    Over40,
}

impl AgeBracket {
    /// Form code 1..=6; anything else means "no constraint".
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::UpTo5),
            2 => Some(Self::From5To10),
            3 => Some(Self::From10To20),
            4 => Some(Self::From20To30),
            5 => Some(Self::From30To40),
            6 => Some(Self::Over40),
            _ => None,
        }
    }

    pub fn bounds(self) -> (u32, u32) {
        match self {
            Self::UpTo5 => (0, 5),
            Self::From5To10 => (5, 10),
            Self::From10To20 => (10, 20),
            Self::From20To30 => (20, 30),
            Self::From30To40 => (30, 40),
            Self::Over40 => (40, 9_999_999),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UpTo5 => "5年以下",
            Self::From5To10 => "5~10年",
            Self::From10To20 => "10~20年",
            Self::From20To30 => "20~30年",
            Self::From30To40 => "30~40年",
            Self::Over40 => "40年以上",
        }
    }
}

/// City code and display name, in portal order.
pub static CITIES: &[(&str, &str)] = &[
    ("C", "基隆市"),
    ("A", "臺北市"),
    ("F", "新北市"),
    ("H", "桃園市"),
    ("O", "新竹市"),
    ("J", "新竹縣"),
    ("K", "苗栗縣"),
    ("B", "臺中市"),
    ("M", "南投縣"),
    ("N", "彰化縣"),
    ("P", "雲林縣"),
    ("I", "嘉義市"),
    ("Q", "嘉義縣"),
    ("D", "臺南市"),
    ("E", "高雄市"),
    ("T", "屏東縣"),
    ("G", "宜蘭縣"),
    ("U", "花蓮縣"),
    ("V", "臺東縣"),
    ("X", "澎湖縣"),
    ("W", "金門縣"),
    ("Z", "連江縣"),
];

/// Towns per city. Order matters: address matching takes the first hit.
pub static TOWNS: &[(&str, &[Town])] = &[
    (
        "C",
        &[
            Town::new("C02", "七堵區"),
            Town::new("C05", "中山區"),
            Town::new("C01", "中正區"),
            Town::new("C04", "仁愛區"),
            Town::new("C06", "安樂區"),
            Town::new("C07", "信義區"),
            Town::new("C03", "暖暖區"),
        ],
    ),
    (
        "A",
        &[
            Town::new("A15", "士林區"),
            Town::new("A09", "大同區"),
            Town::new("A02", "大安區"),
            Town::new("A10", "中山區"),
            Town::new("A03", "中正區"),
            Town::new("A14", "內湖區"),
            Town::new("A11", "文山區"),
            Town::new("A16", "北投區"),
            Town::new("A01", "松山區"),
            Town::new("A17", "信義區"),
            Town::new("A13", "南港區"),
            Town::new("A05", "萬華區"),
        ],
    ),
    (
        "F",
        &[
            Town::new("F32", "八里區"),
            Town::new("F30", "三芝區"),
            Town::new("F05", "三重區"),
            Town::new("F15", "三峽區"),
            Town::new("F19", "土城區"),
            Town::new("F18", "中和區"),
            Town::new("F03", "五股區"),
            Town::new("F22", "平溪區"),
            Town::new("F33", "永和區"),
            Town::new("F31", "石門區"),
            Town::new("F08", "石碇區"),
            Town::new("F28", "汐止區"),
            Town::new("F10", "坪林區"),
            Town::new("F02", "林口區"),
            Town::new("F14", "板橋區"),
            Town::new("F25", "金山區"),
            Town::new("F06", "泰山區"),
            Town::new("F11", "烏來區"),
            Town::new("F24", "貢寮區"),
            Town::new("F27", "淡水區"),
            Town::new("F09", "深坑區"),
            Town::new("F07", "新店區"),
            Town::new("F01", "新莊區"),
            Town::new("F21", "瑞芳區"),
            Town::new("F26", "萬里區"),
            Town::new("F17", "樹林區"),
            Town::new("F23", "雙溪區"),
            Town::new("F04", "蘆洲區"),
            Town::new("F16", "鶯歌區"),
        ],
    ),
    (
        "H",
        &[
            Town::new("H08", "八德區"),
            Town::new("H06", "大園區"),
            Town::new("H02", "大溪區"),
            Town::new("H03", "中壢區"),
            Town::new("H10", "平鎮區"),
            Town::new("H01", "桃園區"),
            Town::new("H13", "復興區"),
            Town::new("H11", "新屋區"),
            Town::new("H04", "楊梅區"),
            Town::new("H09", "龍潭區"),
            Town::new("H07", "龜山區"),
            Town::new("H05", "蘆竹區"),
            Town::new("H12", "觀音區"),
        ],
    ),
    (
        "O",
        &[
            Town::new("O01", "新竹市"),
        ],
    ),
    (
        "J",
        &[
            Town::new("J15", "五峰鄉"),
            Town::new("J12", "北埔鄉"),
            Town::new("J14", "尖石鄉"),
            Town::new("J05", "竹北市"),
            Town::new("J02", "竹東鎮"),
            Town::new("J13", "峨眉鄉"),
            Town::new("J06", "湖口鄉"),
            Town::new("J04", "新埔鎮"),
            Town::new("J09", "新豐鄉"),
            Town::new("J08", "橫山鄉"),
            Town::new("J03", "關西鎮"),
            Town::new("J11", "寶山鄉"),
            Town::new("J10", "芎林鄉"),
        ],
    ),
    (
        "K",
        &[
            Town::new("K06", "三義鄉"),
            Town::new("K13", "三灣鄉"),
            Town::new("K15", "大湖鄉"),
            Town::new("K04", "公館鄉"),
            Town::new("K09", "竹南鎮"),
            Town::new("K07", "西湖鄉"),
            Town::new("K16", "卓蘭鎮"),
            Town::new("K14", "南庄鄉"),
            Town::new("K12", "後龍鎮"),
            Town::new("K01", "苗栗市"),
            Town::new("K02", "苑裡鎮"),
            Town::new("K18", "泰安鄉"),
            Town::new("K03", "通霄鎮"),
            Town::new("K11", "造橋鄉"),
            Town::new("K17", "獅潭鄉"),
            Town::new("K05", "銅鑼鄉"),
            Town::new("K10", "頭份市"),
            Town::new("K08", "頭屋鄉"),
        ],
    ),
    (
        "B",
        &[
            Town::new("B11", "大甲區"),
            Town::new("B22", "大安區"),
            Town::new("B24", "大肚區"),
            Town::new("B28", "大里區"),
            Town::new("B18", "大雅區"),
            Town::new("B01", "中區"),
            Town::new("B27", "太平區"),
            Town::new("B08", "北屯區"),
            Town::new("B05", "北區"),
            Town::new("B21", "外埔區"),
            Town::new("B20", "石岡區"),
            Town::new("B15", "后里區"),
            Town::new("B06", "西屯區"),
            Town::new("B04", "西區"),
            Town::new("B13", "沙鹿區"),
            Town::new("B29", "和平區"),
            Town::new("B02", "東區"),
            Town::new("B10", "東勢區"),
            Town::new("B07", "南屯區"),
            Town::new("B03", "南區"),
            Town::new("B23", "烏日區"),
            Town::new("B16", "神岡區"),
            Town::new("B14", "梧棲區"),
            Town::new("B12", "清水區"),
            Town::new("B19", "新社區"),
            Town::new("B17", "潭子區"),
            Town::new("B25", "龍井區"),
            Town::new("B09", "豐原區"),
            Town::new("B26", "霧峰區"),
        ],
    ),
    (
        "M",
        &[
            Town::new("M08", "中寮鄉"),
            Town::new("M13", "仁愛鄉"),
            Town::new("M11", "水里鄉"),
            Town::new("M06", "名間鄉"),
            Town::new("M04", "竹山鎮"),
            Town::new("M12", "信義鄉"),
            Town::new("M01", "南投市"),
            Town::new("M02", "埔里鎮"),
            Town::new("M03", "草屯鎮"),
            Town::new("M10", "國姓鄉"),
            Town::new("M09", "魚池鄉"),
            Town::new("M07", "鹿谷鄉"),
            Town::new("M05", "集集鎮"),
        ],
    ),
    (
        "N",
        &[
            Town::new("N20", "二水鄉"),
            Town::new("N08", "二林鎮"),
            Town::new("N15", "大村鄉"),
            Town::new("N24", "大城鄉"),
            Town::new("N04", "北斗鎮"),
            Town::new("N18", "永靖鄉"),
            Town::new("N07", "田中鎮"),
            Town::new("N21", "田尾鄉"),
            Town::new("N25", "竹塘鄉"),
            Town::new("N10", "伸港鄉"),
            Town::new("N12", "秀水鄉"),
            Town::new("N03", "和美鎮"),
            Town::new("N19", "社頭鄉"),
            Town::new("N23", "芳苑鄉"),
            Town::new("N13", "花壇鄉"),
            Town::new("N14", "芬園鄉"),
            Town::new("N05", "員林市"),
            Town::new("N17", "埔心鄉"),
            Town::new("N16", "埔鹽鄉"),
            Town::new("N22", "埤頭鄉"),
            Town::new("N02", "鹿港鎮"),
            Town::new("N26", "溪州鄉"),
            Town::new("N06", "溪湖鎮"),
            Town::new("N01", "彰化市"),
            Town::new("N11", "福興鄉"),
            Town::new("N09", "線西鄉"),
        ],
    ),
    (
        "P",
        &[
            Town::new("P11", "二崙鄉"),
            Town::new("P19", "口湖鄉"),
            Town::new("P05", "土庫鎮"),
            Town::new("P08", "大埤鄉"),
            Town::new("P17", "元長鄉"),
            Town::new("P01", "斗六市"),
            Town::new("P02", "斗南鎮"),
            Town::new("P20", "水林鄉"),
            Town::new("P06", "北港鎮"),
            Town::new("P07", "古坑鄉"),
            Town::new("P16", "台西鄉"),
            Town::new("P18", "四湖鄉"),
            Town::new("P04", "西螺鎮"),
            Town::new("P14", "東勢鄉"),
            Town::new("P10", "林內鄉"),
            Town::new("P03", "虎尾鎮"),
            Town::new("P12", "崙背鄉"),
            Town::new("P13", "麥寮鄉"),
            Town::new("P15", "褒忠鄉"),
            Town::new("P09", "莿桐鄉"),
        ],
    ),
    (
        "I",
        &[
            Town::new("I01", "嘉義市"),
        ],
    ),
    (
        "Q",
        &[
            Town::new("Q04", "大林鎮"),
            Town::new("Q18", "大埔鄉"),
            Town::new("Q14", "中埔鄉"),
            Town::new("Q08", "六腳鄉"),
            Town::new("Q12", "太保市"),
            Town::new("Q13", "水上鄉"),
            Town::new("Q03", "布袋鎮"),
            Town::new("Q05", "民雄鄉"),
            Town::new("Q02", "朴子市"),
            Town::new("Q15", "竹崎鄉"),
            Town::new("Q09", "東石鄉"),
            Town::new("Q20", "阿里山鄉"),
            Town::new("Q16", "梅山鄉"),
            Town::new("Q11", "鹿草鄉"),
            Town::new("Q17", "番路鄉"),
            Town::new("Q07", "新港鄉"),
            Town::new("Q06", "溪口鄉"),
            Town::new("Q10", "義竹鄉"),
        ],
    ),
    (
        "D",
        &[
            Town::new("D22", "七股區"),
            Town::new("D16", "下營區"),
            Town::new("D19", "大內區"),
            Town::new("D30", "山上區"),
            Town::new("D08", "中西區"),
            Town::new("D32", "仁德區"),
            Town::new("D17", "六甲區"),
            Town::new("D24", "北門區"),
            Town::new("D04", "北區"),
            Town::new("D31", "左鎮區"),
            Town::new("D39", "永康區"),
            Town::new("D36", "玉井區"),
            Town::new("D12", "白河區"),
            Town::new("D07", "安平區"),
            Town::new("D29", "安定區"),
            Town::new("D06", "安南區"),
            Town::new("D21", "西港區"),
            Town::new("D20", "佳里區"),
            Town::new("D18", "官田區"),
            Town::new("D14", "東山區"),
            Town::new("D01", "東區"),
            Town::new("D38", "南化區"),
            Town::new("D02", "南區"),
            Town::new("D13", "後壁區"),
            Town::new("D11", "柳營區"),
            Town::new("D23", "將軍區"),
            Town::new("D15", "麻豆區"),
            Town::new("D27", "善化區"),
            Town::new("D26", "新化區"),
            Town::new("D28", "新市區"),
            Town::new("D09", "新營區"),
            Town::new("D37", "楠西區"),
            Town::new("D25", "學甲區"),
            Town::new("D35", "龍崎區"),
            Town::new("D33", "歸仁區"),
            Town::new("D34", "關廟區"),
            Town::new("D10", "鹽水區"),
        ],
    ),
    (
        "E",
        &[
            Town::new("E05", "三民區"),
            Town::new("E16", "大社區"),
            Town::new("E14", "大寮區"),
            Town::new("E15", "大樹區"),
            Town::new("E11", "小港區"),
            Town::new("E17", "仁武區"),
            Town::new("E35", "內門區"),
            Town::new("E32", "六龜區"),
            Town::new("E03", "左營區"),
            Town::new("E27", "永安區"),
            Town::new("E22", "田寮區"),
            Town::new("E33", "甲仙區"),
            Town::new("E34", "杉林區"),
            Town::new("E38", "那瑪夏區"),
            Town::new("E19", "岡山區"),
            Town::new("E13", "林園區"),
            Town::new("E23", "阿蓮區"),
            Town::new("E07", "前金區"),
            Town::new("E09", "前鎮區"),
            Town::new("E31", "美濃區"),
            Town::new("E26", "茄萣區"),
            Town::new("E36", "茂林區"),
            Town::new("E08", "苓雅區"),
            Town::new("E37", "桃源區"),
            Town::new("E29", "梓官區"),
            Town::new("E18", "鳥松區"),
            Town::new("E25", "湖內區"),
            Town::new("E06", "新興區"),
            Town::new("E04", "楠梓區"),
            Town::new("E24", "路竹區"),
            Town::new("E02", "鼓山區"),
            Town::new("E30", "旗山區"),
            Town::new("E10", "旗津區"),
            Town::new("E12", "鳳山區"),
            Town::new("E20", "橋頭區"),
            Town::new("E21", "燕巢區"),
            Town::new("E28", "彌陀區"),
            Town::new("E01", "鹽埕區"),
        ],
    ),
    (
        "T",
        &[
            Town::new("T08", "九如鄉"),
            Town::new("T26", "三地門鄉"),
            Town::new("T13", "內埔鄉"),
            Town::new("T14", "竹田鄉"),
            Town::new("T33", "牡丹鄉"),
            Town::new("T23", "車城鄉"),
            Town::new("T09", "里港鄉"),
            Town::new("T21", "佳冬鄉"),
            Town::new("T30", "來義鄉"),
            Town::new("T25", "枋山鄉"),
            Town::new("T16", "枋寮鄉"),
            Town::new("T03", "東港鎮"),
            Town::new("T19", "林邊鄉"),
            Town::new("T06", "長治鄉"),
            Town::new("T20", "南州鄉"),
            Town::new("T01", "屏東市"),
            Town::new("T04", "恆春鎮"),
            Town::new("T31", "春日鄉"),
            Town::new("T18", "崁頂鄉"),
            Town::new("T29", "泰武鄉"),
            Town::new("T22", "琉球鄉"),
            Town::new("T11", "高樹鄉"),
            Town::new("T15", "新埤鄉"),
            Town::new("T17", "新園鄉"),
            Town::new("T32", "獅子鄉"),
            Town::new("T05", "萬丹鄉"),
            Town::new("T12", "萬巒鄉"),
            Town::new("T24", "滿州鄉"),
            Town::new("T28", "瑪家鄉"),
            Town::new("T02", "潮州鎮"),
            Town::new("T27", "霧臺鄉"),
            Town::new("T07", "麟洛鄉"),
            Town::new("T10", "鹽埔鄉"),
        ],
    ),
    (
        "G",
        &[
            Town::new("G10", "三星鄉"),
            Town::new("G11", "大同鄉"),
            Town::new("G07", "五結鄉"),
            Town::new("G08", "冬山鄉"),
            Town::new("G04", "壯圍鄉"),
            Town::new("G01", "宜蘭市"),
            Town::new("G12", "南澳鄉"),
            Town::new("G05", "員山鄉"),
            Town::new("G02", "頭城鎮"),
            Town::new("G03", "礁溪鄉"),
            Town::new("G06", "羅東鎮"),
            Town::new("G09", "蘇澳鎮"),
        ],
    ),
    (
        "U",
        &[
            Town::new("U03", "玉里鎮"),
            Town::new("U02", "光復鄉"),
            Town::new("U05", "吉安鄉"),
            Town::new("U11", "秀林鄉"),
            Town::new("U13", "卓溪鄉"),
            Town::new("U01", "花蓮市"),
            Town::new("U10", "富里鄉"),
            Town::new("U04", "新城鄉"),
            Town::new("U09", "瑞穗鄉"),
            Town::new("U12", "萬榮鄉"),
            Town::new("U06", "壽豐鄉"),
            Town::new("U07", "鳳林鎮"),
            Town::new("U08", "豐濱鄉"),
        ],
    ),
    (
        "V",
        &[
            Town::new("V05", "大武鄉"),
            Town::new("V06", "太麻里鄉"),
            Town::new("V01", "台東市"),
            Town::new("V02", "成功鎮"),
            Town::new("V10", "池上鄉"),
            Town::new("V04", "卑南鄉"),
            Town::new("V12", "延平鄉"),
            Town::new("V07", "東河鄉"),
            Town::new("V15", "金峰鄉"),
            Town::new("V08", "長濱鄉"),
            Town::new("V13", "海端鄉"),
            Town::new("V09", "鹿野鄉"),
            Town::new("V14", "達仁鄉"),
            Town::new("V11", "綠島鄉"),
            Town::new("V03", "關山鎮"),
            Town::new("V16", "蘭嶼鄉"),
        ],
    ),
    (
        "X",
        &[
            Town::new("X06", "七美鄉"),
            Town::new("X03", "白沙鄉"),
            Town::new("X04", "西嶼鄉"),
            Town::new("X01", "馬公市"),
            Town::new("X05", "望安鄉"),
            Town::new("X02", "湖西鄉"),
        ],
    ),
    (
        "W",
        &[
            Town::new("W02", "金沙鎮"),
            Town::new("W03", "金城鎮"),
            Town::new("W01", "金湖鎮"),
            Town::new("W04", "金寧鄉"),
            Town::new("W05", "烈嶼鄉"),
            Town::new("W06", "烏坵鄉"),
        ],
    ),
    (
        "Z",
        &[
            Town::new("Z02", "北竿鄉"),
            Town::new("Z04", "東引鄉"),
            Town::new("Z01", "南竿鄉"),
            Town::new("Z03", "莒光鄉"),
        ],
    ),
];
