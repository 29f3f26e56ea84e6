use timetemplates::calendar::{day_of_year, days_in_month};
use timetemplates::{
    add, format_range, iso_time_from_array, iso_time_to_array, julian_day, normalize,
    parse_duration, parse_iso8601_time_range, subtract, Error, Extras, FieldHandler, FormatError,
    HandlerArgs, HandlerError, HandlerRegistry, ParseError, Template, TimeRange,
};

fn range(iso: &str) -> TimeRange {
    parse_iso8601_time_range(iso).expect("valid ISO-8601 range")
}

fn parse(spec: &str, text: &str) -> TimeRange {
    Template::compile(spec)
        .expect("template compiles")
        .parse(text, &mut Extras::new())
        .expect("name parses")
}

fn format(spec: &str, iso_range: &str) -> String {
    let r = range(iso_range);
    Template::compile(spec)
        .expect("template compiles")
        .format_time_range(&r, &Extras::new())
        .expect("range formats")
}

#[test]
fn calendar_kernel_is_usable_directly() {
    assert_eq!(days_in_month(2000, 2).unwrap(), 29);
    assert_eq!(days_in_month(1900, 2).unwrap(), 28);
    assert_eq!(days_in_month(2024, 2).unwrap(), 29);

    let mut t = [2000, 1, 1, 24, 0, 0, 0];
    normalize(&mut t).unwrap();
    assert_eq!(t, [2000, 1, 2, 0, 0, 0, 0]);

    assert_eq!(
        iso_time_from_array(&[2000, 1, 45, 23, 0, 0, 0]).unwrap(),
        "2000-02-14T23:00:00.000000000Z"
    );
    assert_eq!(day_of_year(2000, 3, 1).unwrap(), 61);

    let start = iso_time_to_array("2020-01-31").unwrap();
    let month = parse_duration("P1M").unwrap();
    assert_eq!(add(&start, &month).unwrap(), [2020, 3, 2, 0, 0, 0, 0]);
    assert_eq!(subtract(&[2020, 3, 1, 0, 0, 0, 0], &[2020, 2, 1, 0, 0, 0, 0]).unwrap(), [0, 1, 0, 0, 0, 0, 0]);
    assert_eq!(julian_day(2000, 1, 1).unwrap(), 2_451_545);
}

#[test]
fn parse_matches_known_names() {
    let cases = [
        ("$Y$m$d-$(enum;values=a,b,c,d)", "20130202-a", "2013-02-02/2013-02-03"),
        ("$(periodic;offset=0;start=2000-001;period=P1D)", "0", "2000-001/P1D"),
        ("$(periodic;offset=0;start=2000-001;period=P1D)", "20", "2000-021/P1D"),
        ("$(periodic;offset=2285;start=2000-346;period=P27D)", "1", "1832-02-08/P27D"),
        ("$(periodic;offset=2285;start=2000-346;period=P27D)", "2286", "2001-007/P27D"),
        ("$(j;Y=2012)$(hrinterval;names=01,02,03,04)", "01702", "2012-01-17T06:00/PT6H"),
        (
            "$(j;Y=2012).$H$M$S.$(subsec;places=3)",
            "017.020000.245",
            "2012-01-17T02:00:00.245/2012-01-17T02:00:00.246",
        ),
        (
            "ac27_crn$x_$Y$j00-$(Y;end)$(j;end)00.gif",
            "ac27_crn1926_199722300-199725000.gif",
            "1997-223T00:00/1997-250T00:00",
        ),
        ("$Y_$(b;case=uc;fmt=full)_$d_$v", "2000_NOVEMBER_23_00", "2000-11-23T00:00Z/2000-11-24T00:00Z"),
        ("$Y$m$d-$(Y;end)$m$(d;shift=1)", "20200101-20200107", "2020-01-01/2020-01-08"),
        (
            "data_$Y_$j_$(Y;end)_$(j;shift=1;phasestart=2009-001).dat",
            "data_2009_001_2009_002.dat",
            "2009-01-01/2009-01-03",
        ),
        ("$Y$m$(d;delta=10;phasestart=1979-01-01)", "19791227", "1979-12-27/1980-01-06"),
        ("$-1Y $-1m $-1d $H$M", "2014 04 1 0000", "2014-04-01T00:00/2014-04-01T00:01"),
    ];
    for (spec, text, expected) in cases {
        assert_eq!(parse(spec, text), range(expected), "{spec} on {text}");
    }
}

#[test]
fn format_matches_known_names() {
    let cases = [
        ("$(periodic;offset=0;start=2000-001;period=P1D)", "0", "2000-001/P1D"),
        ("$(periodic;offset=0;start=2000-001;period=P1D)", "20", "2000-021/P1D"),
        ("$(periodic;offset=2285;start=2000-346;period=P27D)", "1", "1832-02-08/P27D"),
        ("$(periodic;offset=2285;start=2000-346;period=P27D)", "2286", "2001-007/P27D"),
        ("$(j;Y=2012)$(hrinterval;names=01,02,03,04)", "01702", "2012-01-17T06:00/2012-01-17T18:00"),
        (
            "$(j;Y=2012).$H$M$S.$(subsec;places=3)",
            "017.020000.245",
            "2012-01-17T02:00:00.245/2012-01-17T02:00:00.246",
        ),
        (
            "$(j;Y=2012).$H$M$S.$(subsec;places=3)",
            "017.020000.999",
            "2012-01-17T02:00:00.9996/2012-01-17T02:00:00.9997",
        ),
        ("$Y/$Y$(j;div=100)XX/$Y$j.dat", "2024/20241XX/2024187.dat", "2024-07-05/P1D"),
        ("/gif/ac_$Y$j$H-$(Y;end)$j$H.gif", "/gif/ac_199733000-199733100.gif", "1997-11-26T00:00Z/1997-11-27T00:00Z"),
        ("$(b;case=lc)", "feb", "2024-02-01/2024-03-01"),
        ("$(b;fmt=full;case=uc)", "FEBRUARY", "2024-02-01/2024-03-01"),
        ("$(b;fmt=full;case=cap) $(d;pad=none), $Y", "February 2, 2022", "2022-02-02/2022-02-03"),
    ];
    for (spec, expected, iso_range) in cases {
        assert_eq!(format(spec, iso_range), expected, "{spec} over {iso_range}");
    }
}

#[test]
fn named_fields_fill_extras() {
    let mut extras = Extras::new();
    let t = Template::compile("$Y_sc$(enum;values=a,b,c,d;id=sc)").unwrap();
    let r = t.parse("2003_scd", &mut extras).unwrap();
    assert_eq!(r.start[0], 2003);
    assert_eq!(extras["sc"], "d");

    let mut extras = Extras::new();
    let t = Template::compile("$Y_$m_v$v.dat").unwrap();
    let r = t.parse("2003_10_v20.3.dat", &mut extras).unwrap();
    assert_eq!(r.start, [2003, 10, 1, 0, 0, 0, 0]);
    assert_eq!(r.stop[1], 11);
    assert_eq!(extras["v"], "20.3");

    let mut extras = Extras::new();
    let t = Template::compile(
        "http://example.com/data/$Y/$Y_$m_$d/$(x;name=d5)/fa_k0_dcf_$x_$(x;name=mm).gif",
    )
    .unwrap();
    let r = t
        .parse("http://example.com/data/2008/2008_03_04/46565/fa_k0_dcf_46565_in.gif", &mut extras)
        .unwrap();
    assert_eq!(r, range("2008-03-04/2008-03-05"));
    assert_eq!(extras["d5"], "46565");
    assert_eq!(extras["mm"], "in");
}

#[test]
fn padded_wildcard_round_trips() {
    let mut extras = Extras::new();
    extras.insert("sc".into(), "Apple".into());
    let t = Template::compile("/tmp/ap/$(x;name=sc;len=6;pad=_).dat").unwrap();
    assert_eq!(t.format("2000-01-01", "2000-01-02", &extras).unwrap(), "/tmp/ap/_Apple.dat");

    let t = Template::compile("/tmp/ap/$Y_$(x;name=sc;len=6;pad=_).dat").unwrap();
    let mut parsed = Extras::new();
    let r = t.parse("/tmp/ap/2024__Apple.dat", &mut parsed).unwrap();
    assert_eq!(r.to_array(), [2024, 1, 1, 0, 0, 0, 0, 2025, 1, 1, 0, 0, 0, 0]);
    assert_eq!(parsed["sc"], "Apple");
}

#[test]
fn format_range_enumerates_names() {
    let names = format_range("data_$Y.dat", "2001-03-22", "2004-08-18", &Extras::new()).unwrap();
    assert_eq!(names, ["data_2001.dat", "data_2002.dat", "data_2003.dat", "data_2004.dat"]);

    let names = format_range(
        "$Y$m$(d,delta=10,phasestart=1979-01-01)",
        "1979-01-01",
        "1980-01-01",
        &Extras::new(),
    )
    .unwrap();
    assert_eq!(names.len(), 37);
    assert_eq!(names[0], "19790101");
    assert_eq!(names[36], "19791227");

    let mut extras = Extras::new();
    extras.insert("sc".into(), "a".into());
    extras.insert("v".into(), "1.5.15".into());
    let spec = "http://emfisis.physics.uiowa.edu/Flight/rbsp-$(x,name=sc,enum=a|b)/L4/$Y/$m/$d/rbsp-$(x,name=sc,enum=a|b)_density_emfisis-L4_$Y$m$d_v$(v,sep).cdf";
    let names = format_range(spec, "2017-07-01", "2017-07-04", &extras).unwrap();
    assert_eq!(names.len(), 3);
    assert_eq!(
        names[0],
        "http://emfisis.physics.uiowa.edu/Flight/rbsp-a/L4/2017/07/01/rbsp-a_density_emfisis-L4_20170701_v1.5.15.cdf"
    );
}

#[test]
fn enumeration_with_external_context() {
    let names = format_range("$m$d.dat", "2016-02-27", "2016-03-02", &Extras::new()).unwrap();
    assert_eq!(names, ["0227.dat", "0228.dat", "0229.dat", "0301.dat"]);
}

#[test]
fn round_trip_at_template_granularity() {
    let instant = "2021-06-15T10:20:30.123Z";
    for spec in ["$Y$m$dT$H$M", "$Y_$j", "$y$m", "$Y$m$d_$H", "$Y$m$d_$(milli)"] {
        let t = Template::compile(spec).unwrap();
        let name = t.format(instant, instant, &Extras::new()).unwrap();
        let first = t.parse_range(&name).unwrap();
        let again = t.format_time_range(&first, &Extras::new()).unwrap();
        assert_eq!(again, name, "{spec}");
        assert_eq!(t.parse_range(&again).unwrap(), first, "{spec}");
    }
}

#[test]
fn errors_are_typed_per_layer() {
    assert!(matches!(Template::compile("$(Y;end"), Err(timetemplates::CompileError::UnmatchedParen(_))));

    let t = Template::compile("ac_$Y$j00-$(Y;end)$(j;end)00.gif").unwrap();
    assert!(matches!(
        t.parse("AC_199811900-199812000.gif", &mut Extras::new()),
        Err(ParseError::MissingDelimiter { .. })
    ));

    let t = Template::compile("$Y_$(ignore).dat").unwrap();
    assert!(matches!(
        t.format("2020-01-01", "2021-01-01", &Extras::new()),
        Err(FormatError::Unsupported(_))
    ));

    let err = format_range("$Y", "2021-01-01", "2020-01-01", &Extras::new()).unwrap_err();
    assert_eq!(err, Error::InvertedRange);
    let err = format_range("$Q", "2020-01-01", "2021-01-01", &Extras::new()).unwrap_err();
    assert!(matches!(err, Error::Compile(_)));
}

#[test]
fn custom_handlers_plug_into_templates() {
    /// Orbit numbers, one orbit per 12 hours from 2000-01-01.
    #[derive(Debug, Default)]
    struct Orbit;

    impl FieldHandler for Orbit {
        fn configure(&mut self, _args: &HandlerArgs) -> Result<(), HandlerError> {
            Ok(())
        }

        fn regex(&self) -> Option<String> {
            Some("[0-9]{4}".into())
        }

        fn parse(
            &self,
            field: &str,
            start: &mut [i32; 7],
            width: &mut [i32; 7],
            _extras: &mut Extras,
        ) -> Result<(), HandlerError> {
            let orbit: i32 = field.parse().map_err(|_| HandlerError::Rejected {
                value: field.to_string(),
                reason: "not an orbit number".into(),
            })?;
            *start = [2000, 1, 1 + orbit / 2, 12 * (orbit % 2), 0, 0, 0];
            normalize(start)?;
            *width = [0, 0, 0, 12, 0, 0, 0];
            Ok(())
        }

        fn format(
            &self,
            start: &[i32; 7],
            _width: &[i32; 7],
            _length: Option<usize>,
            _extras: &Extras,
        ) -> Result<String, HandlerError> {
            let days = julian_day(start[0], start[1], start[2])? - julian_day(2000, 1, 1)?;
            Ok(format!("{:04}", days * 2 + start[3] / 12))
        }
    }

    let registry = HandlerRegistry::default().with_handler("orbit", || Box::new(Orbit));
    let t = Template::with_registry("orb_$(orbit).dat", &registry).unwrap();
    assert!(t.is_match("orb_0003.dat"));
    assert_eq!(t.parse_range("orb_0003.dat").unwrap(), range("2000-01-02T12:00/2000-01-03T00:00"));
    let names = t.format_range("2000-01-01T06:00", "2000-01-02T00:00", &Extras::new()).unwrap();
    assert_eq!(names, ["orb_0000.dat", "orb_0001.dat"]);

    assert!(Template::compile("orb_$(orbit).dat").is_err());
}

#[cfg(feature = "serde")]
#[test]
fn serde_time_range_and_field_codes() {
    use timetemplates::{FieldCode, Pad};

    let r = range("2020-01-01/2020-01-02");
    let json = serde_json::to_string(&r).unwrap();
    let back: TimeRange = serde_json::from_str(&json).unwrap();
    assert_eq!(back, r);

    let t = Template::compile("$Y_$(m;pad=space)_$(enum;values=a,b)").unwrap();
    let codes: Vec<&FieldCode> = t.fields().iter().map(|f| f.code()).collect();
    let json = serde_json::to_string(&codes).unwrap();
    assert_eq!(json, r#"["Year","Month",{"Handler":"enum"}]"#);
    assert_eq!(serde_json::to_string(&Pad::Space).unwrap(), r#""space""#);
}
