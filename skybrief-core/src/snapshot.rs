use crate::{
    error::WeatherError,
    model::{RawWeatherResponse, WeatherSnapshot},
    units::kelvin_to_celsius,
};

/// Map a raw current-weather response to a [`WeatherSnapshot`].
///
/// The status field is checked before any data field, so an error payload
/// for an unknown city yields [`WeatherError::Provider`] rather than a
/// missing-field error.
pub fn build_snapshot(raw: &RawWeatherResponse, city: &str) -> Result<WeatherSnapshot, WeatherError> {
    raw.check_status()?;

    let main = raw.main.as_ref().ok_or_else(|| WeatherError::missing("main"))?;
    let temp = main.temp.ok_or_else(|| WeatherError::missing("main.temp"))?;
    let feels_like = main
        .feels_like
        .ok_or_else(|| WeatherError::missing("main.feels_like"))?;
    let humidity = main
        .humidity
        .ok_or_else(|| WeatherError::missing("main.humidity"))?;
    let pressure = main
        .pressure
        .ok_or_else(|| WeatherError::missing("main.pressure"))?;

    let condition = raw
        .weather
        .first()
        .ok_or_else(|| WeatherError::missing("weather[0]"))?
        .description
        .clone()
        .ok_or_else(|| WeatherError::missing("weather[0].description"))?;

    let wind_speed = raw
        .wind
        .as_ref()
        .ok_or_else(|| WeatherError::missing("wind"))?
        .speed
        .ok_or_else(|| WeatherError::missing("wind.speed"))?;

    let humidity_pct = u8::try_from(whole_in_range("main.humidity", humidity, 0.0, 100.0)?)
        .map_err(|_| out_of_range("main.humidity", humidity))?;
    let pressure_hpa = u32::try_from(whole_in_range(
        "main.pressure",
        pressure,
        0.0,
        f64::from(u32::MAX),
    )?)
    .map_err(|_| out_of_range("main.pressure", pressure))?;

    let coord = raw.coord.as_ref().ok_or_else(|| WeatherError::missing("coord"))?;
    let lat = coord.lat.ok_or_else(|| WeatherError::missing("coord.lat"))?;
    let lon = coord.lon.ok_or_else(|| WeatherError::missing("coord.lon"))?;

    Ok(WeatherSnapshot {
        city: city.to_string(),
        temperature_c: kelvin_to_celsius(temp),
        feels_like_c: kelvin_to_celsius(feels_like),
        temp_min_c: kelvin_to_celsius(main.temp_min.unwrap_or(temp)),
        temp_max_c: kelvin_to_celsius(main.temp_max.unwrap_or(temp)),
        humidity_pct,
        pressure_hpa,
        wind_speed_ms: wind_speed,
        visibility_m: raw
            .visibility
            .and_then(|v| u32::try_from(v).ok()),
        condition,
        lat,
        lon,
    })
}

/// Rounds `value` to a whole number, rejecting it when it falls outside `lo..=hi`.
fn whole_in_range(path: &str, value: f64, lo: f64, hi: f64) -> Result<i64, WeatherError> {
    let rounded = value.round();
    if !(lo..=hi).contains(&rounded) {
        return Err(out_of_range(path, value));
    }
    Ok(rounded as i64)
}

fn out_of_range(path: &str, value: f64) -> WeatherError {
    WeatherError::Parse(format!("{path} is out of range: {value}"))
}
