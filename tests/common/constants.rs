//! Shared constants for integration tests.

/// Header in the column order of the public songs dataset, including columns
/// the pipeline ignores (`key`, `mode`).
pub const CSV_HEADER: &str = "artist,song,duration_ms,explicit,year,popularity,danceability,energy,\
key,loudness,mode,speechiness,acousticness,instrumentalness,liveness,valence,tempo,genre";

/// Rows that survive the filter: 7 tracks by 4 artists ("Drake" appears in
/// two spellings) across 3 genres.
pub const KEPT_ROWS: &[&str] = &[
    "Drake,One Dance,173986,False,2016,84,0.792,0.625,1,-5.609,1,0.536,0.00776,0.0018,0.329,0.37,103.967,\"hip hop, pop, R&B\"",
    "drake,Hotline Bling,267066,False,2015,75,0.891,0.628,2,-7.863,1,0.351,0.00258,0.00019,0.0504,0.552,134.966,\"hip hop, pop, R&B\"",
    "Eminem,Without Me,290320,True,2002,82,0.908,0.669,7,-2.827,1,0.38,0.00286,0,0.237,0.662,112.238,hip hop",
    "Eminem,The Real Slim Shady,284200,True,2000,86,0.949,0.661,5,-4.244,0,0.45,0.0302,0,0.0454,0.76,104.504,hip hop",
    "Kendrick Lamar,HUMBLE.,177000,True,2017,80,0.908,0.621,1,-6.638,0,0.4,0.000282,5.39e-05,0.0958,0.421,150.011,hip hop",
    "Kendrick Lamar,DNA.,185946,True,2017,77,0.637,0.514,1,-6.763,1,0.36,0.00428,0,0.0941,0.402,139.931,hip hop",
    "Migos,Bad and Boujee,343150,True,2017,78,0.927,0.665,11,-5.313,1,0.34,0.0611,0,0.123,0.175,127.076,hip hop",
];

/// Rows the filter drops: too unpopular, too little speech, not danceable.
pub const DROPPED_ROWS: &[&str] = &[
    "Nobody,Flop,200000,False,2016,40,0.7,0.6,1,-5.0,1,0.4,0.1,0,0.1,0.5,100.0,pop",
    "Britney Spears,Oops!...I Did It Again,211160,False,2000,77,0.751,0.834,1,-5.444,0,0.0437,0.3,1.77e-05,0.355,0.894,95.053,pop",
    "Slowcore,Drift,300000,False,2016,70,0.1,0.2,1,-15.0,1,0.4,0.9,0.8,0.1,0.1,60.0,rock",
];

/// Passes the filter but has an unparseable year.
pub const MALFORMED_ROW: &str =
    "Mystery,Unknown Year,200000,False,someday,70,0.7,0.6,1,-5.0,1,0.4,0.1,0,0.1,0.5,100.0,pop";
